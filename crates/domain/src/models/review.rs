//! Tour review domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::lenient;

/// A customer review of a tour.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub tour_id: i64,
    pub author_name: String,
    pub rating: i32,
    pub text: String,
    pub is_moderated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review form from the public site. Moderation state cannot be set here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(alias = "customerName")]
    pub author_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub rating: Option<i32>,
    #[serde(alias = "comment")]
    pub text: Option<String>,
}

/// Validated review values.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewReview {
    pub tour_id: i64,

    #[validate(length(min = 1, max = 200, message = "authorName must be 1-200 characters"))]
    pub author_name: String,

    #[validate(custom(function = "shared::validation::validate_rating"))]
    pub rating: i32,

    #[validate(length(min = 1, max = 5000, message = "text must be 1-5000 characters"))]
    pub text: String,
}

impl CreateReviewRequest {
    pub fn into_new(self, tour_id: i64) -> Result<NewReview, String> {
        let author_name = self
            .author_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "authorName is required".to_string())?;
        let rating = self.rating.ok_or_else(|| "rating is required".to_string())?;
        let text = self
            .text
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "text is required".to_string())?;

        Ok(NewReview {
            tour_id,
            author_name,
            rating,
            text,
        })
    }
}

/// Admin moderation toggle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReviewRequest {
    pub is_moderated: bool,
}

/// Review listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub tour_id: Option<i64>,
    pub moderated: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

/// Average rating (one decimal) and count over moderated reviews.
pub fn rating_summary(reviews: &[Review]) -> (f64, i32) {
    let ratings: Vec<i32> = reviews
        .iter()
        .filter(|r| r.is_moderated)
        .map(|r| r.rating)
        .collect();
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: i32 = ratings.iter().sum();
    let average = f64::from(sum) / ratings.len() as f64;
    ((average * 10.0).round() / 10.0, ratings.len() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review(rating: i32, is_moderated: bool) -> Review {
        Review {
            id: 1,
            tour_id: 1,
            author_name: "Nodira".into(),
            rating,
            text: "Great".into(),
            is_moderated,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_counts_only_moderated() {
        let reviews = vec![review(5, true), review(4, true), review(1, false)];
        assert_eq!(rating_summary(&reviews), (4.5, 2));
        assert_eq!(rating_summary(&[]), (0.0, 0));
    }

    #[test]
    fn test_summary_rounds_to_one_decimal() {
        let reviews = vec![review(5, true), review(4, true), review(4, true)];
        assert_eq!(rating_summary(&reviews), (4.3, 3));
    }

    #[test]
    fn test_create_ignores_moderation_flag() {
        let request: CreateReviewRequest = serde_json::from_value(json!({
            "authorName": "Rustam",
            "rating": "5",
            "text": "Unforgettable",
            "isModerated": true
        }))
        .unwrap();
        let new = request.into_new(3).unwrap();
        assert_eq!(new.rating, 5);
        assert_eq!(new.tour_id, 3);
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_rating_out_of_range() {
        let request = CreateReviewRequest {
            author_name: Some("Rustam".into()),
            rating: Some(6),
            text: Some("Too good".into()),
        };
        assert!(request.into_new(1).unwrap().validate().is_err());
    }

    #[test]
    fn test_missing_text() {
        let request = CreateReviewRequest {
            author_name: Some("Rustam".into()),
            rating: Some(4),
            text: None,
        };
        assert_eq!(request.into_new(1).unwrap_err(), "text is required");
    }
}
