//! Price calculator component entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::multilingual::parse_field;
use domain::models::price_component::PriceComponent;
use serde_json::Value;
use sqlx::FromRow;

/// Database row mapping for the price_calculator_components table.
#[derive(Debug, Clone, FromRow)]
pub struct PriceComponentEntity {
    pub id: i64,
    pub key: String,
    pub name: Value,
    pub price: f64,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const PRICE_COMPONENT_COLUMNS: &str =
    "id, key, name, price, unit, category, sort_order, created_at, updated_at";

impl From<PriceComponentEntity> for PriceComponent {
    fn from(entity: PriceComponentEntity) -> Self {
        Self {
            id: entity.id,
            key: entity.key,
            name: parse_field(&entity.name),
            price: entity.price,
            unit: entity.unit,
            category: entity.category,
            sort_order: entity.sort_order,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
