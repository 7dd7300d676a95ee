//! Review entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::review::Review;
use sqlx::FromRow;

/// Database row mapping for the reviews table.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewEntity {
    pub id: i64,
    pub tour_id: i64,
    pub author_name: String,
    pub rating: i32,
    pub text: String,
    pub is_moderated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const REVIEW_COLUMNS: &str =
    "id, tour_id, author_name, rating, text, is_moderated, created_at, updated_at";

impl From<ReviewEntity> for Review {
    fn from(entity: ReviewEntity) -> Self {
        Self {
            id: entity.id,
            tour_id: entity.tour_id,
            author_name: entity.author_name,
            rating: entity.rating,
            text: entity.text,
            is_moderated: entity.is_moderated,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
