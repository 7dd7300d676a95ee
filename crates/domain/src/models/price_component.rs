//! Price calculator components and tour price breakdowns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;
use super::multilingual::MultilingualText;
use super::tour::{PriceType, Tour};

/// A priced add-on referenced by key from `Tour.services`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceComponent {
    pub id: i64,
    pub key: String,
    pub name: MultilingualText,
    pub price: f64,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create-or-update payload. `key` comes from the path on updates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPriceComponentRequest {
    pub key: Option<String>,
    pub name: Option<MultilingualText>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub price: Option<f64>,
    pub unit: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub sort_order: Option<i32>,
}

/// Validated component values.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPriceComponent {
    pub key: String,
    pub name: MultilingualText,
    pub price: f64,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub sort_order: i32,
}

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 100
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl UpsertPriceComponentRequest {
    /// Validates the payload. `path_key` overrides any key in the body.
    pub fn into_new(self, path_key: Option<&str>) -> Result<NewPriceComponent, String> {
        let key = path_key
            .map(str::to_string)
            .or(self.key)
            .map(|k| k.trim().to_string())
            .ok_or_else(|| "key is required".to_string())?;
        if !valid_key(&key) {
            return Err("key may only contain letters, digits, '-' and '_'".to_string());
        }
        let name = self
            .name
            .filter(|n| !n.is_blank())
            .ok_or_else(|| "name is required".to_string())?;
        let price = self.price.ok_or_else(|| "price is required".to_string())?;
        shared::validation::validate_price(price)
            .map_err(|_| "price must be a non-negative number".to_string())?;

        Ok(NewPriceComponent {
            key,
            name,
            price,
            unit: self.unit.filter(|u| !u.trim().is_empty()),
            category: self.category.filter(|c| !c.trim().is_empty()),
            sort_order: self.sort_order.unwrap_or(0),
        })
    }
}

/// One resolved line of a price breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceLine {
    pub key: String,
    pub name: MultilingualText,
    pub unit: Option<String>,
    pub unit_price: f64,
    pub quantity: i32,
    pub amount: f64,
}

/// Tour price split into the base price and its service components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub tour_id: i64,
    pub price_type: PriceType,
    pub people: i32,
    pub base_price: f64,
    pub lines: Vec<PriceLine>,
    /// Service keys with no matching component.
    pub unknown_keys: Vec<String>,
    pub total: f64,
}

/// Extracts `(key, quantity)` from a `services` entry, which is either a
/// bare key string or an object with `key` and optional `quantity`.
fn service_entry(entry: &Value) -> Option<(String, i32)> {
    match entry {
        Value::String(key) => Some((key.clone(), 1)),
        Value::Object(map) => {
            let key = map.get("key")?.as_str()?.to_string();
            let quantity = map
                .get("quantity")
                .and_then(Value::as_i64)
                .and_then(|q| i32::try_from(q).ok())
                .unwrap_or(1)
                .max(1);
            Some((key, quantity))
        }
        _ => None,
    }
}

/// Resolves a tour's service keys against the component catalog.
pub fn price_breakdown(tour: &Tour, components: &[PriceComponent], people: i32) -> PriceBreakdown {
    let people = people.max(1);
    let mut lines = Vec::new();
    let mut unknown_keys = Vec::new();

    for (key, quantity) in tour.services.iter().filter_map(service_entry) {
        match components.iter().find(|c| c.key == key) {
            Some(component) => lines.push(PriceLine {
                key,
                name: component.name.clone(),
                unit: component.unit.clone(),
                unit_price: component.price,
                quantity,
                amount: component.price * f64::from(quantity),
            }),
            None => unknown_keys.push(key),
        }
    }

    let base_price = tour.price_type.total(tour.price, people);
    let total = base_price + lines.iter().map(|l| l.amount).sum::<f64>();

    PriceBreakdown {
        tour_id: tour.id,
        price_type: tour.price_type,
        people,
        base_price,
        lines,
        unknown_keys,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn component(key: &str, price: f64) -> PriceComponent {
        PriceComponent {
            id: 1,
            key: key.into(),
            name: MultilingualText::mirrored(key),
            price,
            unit: Some("day".into()),
            category: None,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tour(services: Vec<Value>, price_type: PriceType) -> Tour {
        Tour {
            id: 9,
            title: MultilingualText::mirrored("Tour"),
            description: MultilingualText::default(),
            short_description: None,
            price: 100.0,
            price_type,
            duration_days: 3,
            is_draft: false,
            is_active: true,
            services,
            itinerary: vec![],
            images: vec![],
            map_points: vec![],
            rating: 0.0,
            reviews_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_breakdown_resolves_keys() {
        let tour = tour(
            vec![json!("guide"), json!({"key": "jeep", "quantity": 2}), json!("spa")],
            PriceType::PerPerson,
        );
        let components = vec![component("guide", 50.0), component("jeep", 80.0)];

        let breakdown = price_breakdown(&tour, &components, 2);
        assert_eq!(breakdown.base_price, 200.0);
        assert_eq!(breakdown.lines.len(), 2);
        assert_eq!(breakdown.lines[1].amount, 160.0);
        assert_eq!(breakdown.unknown_keys, vec!["spa".to_string()]);
        assert_eq!(breakdown.total, 410.0);
    }

    #[test]
    fn test_breakdown_per_group_ignores_people() {
        let tour = tour(vec![], PriceType::PerGroup);
        let breakdown = price_breakdown(&tour, &[], 6);
        assert_eq!(breakdown.base_price, 100.0);
        assert_eq!(breakdown.total, 100.0);
    }

    #[test]
    fn test_upsert_validation() {
        let request: UpsertPriceComponentRequest =
            serde_json::from_value(json!({"name": {"ru": "Гид", "en": "Guide"}, "price": "40"})).unwrap();
        let new = request.into_new(Some("guide")).unwrap();
        assert_eq!(new.key, "guide");
        assert_eq!(new.price, 40.0);

        let request: UpsertPriceComponentRequest =
            serde_json::from_value(json!({"key": "bad key", "name": "x", "price": 1})).unwrap();
        assert!(request.into_new(None).is_err());

        let request: UpsertPriceComponentRequest =
            serde_json::from_value(json!({"key": "guide", "name": "x", "price": -1})).unwrap();
        assert!(request.into_new(None).is_err());
    }
}
