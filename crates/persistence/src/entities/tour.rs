//! Tour entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::multilingual::parse_field;
use domain::models::tour::{MapPoint, PriceType, Tour};
use serde_json::Value;
use sqlx::FromRow;

/// Database row mapping for the tours table.
#[derive(Debug, Clone, FromRow)]
pub struct TourEntity {
    pub id: i64,
    pub title: Value,
    pub description: Value,
    pub short_description: Option<Value>,
    pub price: f64,
    pub price_type: String,
    pub duration_days: i32,
    pub is_draft: bool,
    pub is_active: bool,
    pub services: Value,
    pub itinerary: Value,
    pub images: Value,
    pub map_points: Value,
    pub rating: f64,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns selected for [`TourEntity`].
pub const TOUR_COLUMNS: &str = "id, title, description, short_description, price, price_type, \
     duration_days, is_draft, is_active, services, itinerary, images, map_points, rating, \
     reviews_count, created_at, updated_at";

/// JSONB list column as a vector. Older rows stored the list as a
/// JSON-encoded string.
pub(crate) fn json_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::String(s) => match serde_json::from_str(&s) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn map_points(value: Value) -> Vec<MapPoint> {
    json_list(value)
        .into_iter()
        .filter_map(|point| serde_json::from_value(point).ok())
        .collect()
}

impl From<TourEntity> for Tour {
    fn from(entity: TourEntity) -> Self {
        let price_type = entity.price_type.parse().unwrap_or_else(|_| {
            tracing::warn!(
                tour_id = entity.id,
                price_type = %entity.price_type,
                "Unknown price type in tours row, using per_person"
            );
            PriceType::PerPerson
        });

        Self {
            id: entity.id,
            title: parse_field(&entity.title),
            description: parse_field(&entity.description),
            short_description: entity.short_description.as_ref().map(parse_field),
            price: entity.price,
            price_type,
            duration_days: entity.duration_days,
            is_draft: entity.is_draft,
            is_active: entity.is_active,
            services: json_list(entity.services),
            itinerary: json_list(entity.itinerary),
            images: json_list(entity.images),
            map_points: map_points(entity.map_points),
            rating: entity.rating,
            reviews_count: entity.reviews_count,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_tour_entity() -> TourEntity {
        TourEntity {
            id: 1,
            title: json!({"ru": "Памир", "en": "Pamir"}),
            description: json!("Старое описание"),
            short_description: None,
            price: 1500.0,
            price_type: "per_group".into(),
            duration_days: 10,
            is_draft: false,
            is_active: true,
            services: json!("[\"guide\"]"),
            itinerary: json!([{"day": 1, "title": {"ru": "Душанбе"}}]),
            images: json!(null),
            map_points: json!([{"lat": 38.5, "lng": 68.7}, {"lat": "bad"}]),
            rating: 4.8,
            reviews_count: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tour_entity_to_domain() {
        let tour: Tour = create_test_tour_entity().into();
        assert_eq!(tour.title.en.as_deref(), Some("Pamir"));
        assert_eq!(tour.description.ru.as_deref(), Some("Старое описание"));
        assert_eq!(tour.description.en.as_deref(), Some("Старое описание"));
        assert_eq!(tour.price_type, PriceType::PerGroup);
        assert_eq!(tour.services, vec![json!("guide")]);
        assert_eq!(tour.itinerary.len(), 1);
        assert!(tour.images.is_empty());
        assert_eq!(tour.map_points.len(), 1);
    }

    #[test]
    fn test_unknown_price_type_falls_back() {
        let mut entity = create_test_tour_entity();
        entity.price_type = "per_day".into();
        let tour: Tour = entity.into();
        assert_eq!(tour.price_type, PriceType::PerPerson);
    }
}
