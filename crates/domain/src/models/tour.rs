//! Tour domain models, payloads and the draft/publish lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use validator::Validate;

use super::association::{primary_id, AssociationLink, AssociationWrite, AssociationWrites};
use super::lenient;
use super::multilingual::MultilingualText;
use super::reference::{ReferenceItem, ReferenceKind};

/// Suffix appended to titles of duplicated tours.
pub const COPY_SUFFIX: &str = " (Copy)";

/// How the tour price is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    #[default]
    PerPerson,
    PerGroup,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::PerPerson => "per_person",
            PriceType::PerGroup => "per_group",
        }
    }

    /// Total for a party of `people`.
    pub fn total(&self, price: f64, people: i32) -> f64 {
        match self {
            PriceType::PerPerson => price * f64::from(people.max(0)),
            PriceType::PerGroup => price,
        }
    }
}

impl std::str::FromStr for PriceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_person" => Ok(PriceType::PerPerson),
            "per_group" => Ok(PriceType::PerGroup),
            _ => Err(format!("Invalid price type: {}", s)),
        }
    }
}

/// Lifecycle state derived from `is_draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TourStatus {
    Draft,
    Published,
}

impl fmt::Display for TourStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TourStatus::Draft => write!(f, "draft"),
            TourStatus::Published => write!(f, "published"),
        }
    }
}

/// A waypoint on the tour map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MapPoint {
    #[serde(alias = "latitude")]
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub lat: f64,

    #[serde(alias = "longitude")]
    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub lng: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<MultilingualText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<i32>,
}

/// A tour row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: i64,
    pub title: MultilingualText,
    pub description: MultilingualText,
    pub short_description: Option<MultilingualText>,
    pub price: f64,
    pub price_type: PriceType,
    pub duration_days: i32,
    pub is_draft: bool,
    pub is_active: bool,
    pub services: Vec<Value>,
    pub itinerary: Vec<Value>,
    pub images: Vec<Value>,
    pub map_points: Vec<MapPoint>,
    pub rating: f64,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tour {
    pub fn status(&self) -> TourStatus {
        if self.is_draft {
            TourStatus::Draft
        } else {
            TourStatus::Published
        }
    }
}

/// A join row together with the entity it points to.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedReference {
    pub link: AssociationLink,
    pub item: Option<ReferenceItem>,
}

/// A tour with all of its associations.
#[derive(Debug, Clone, PartialEq)]
pub struct TourDetails {
    pub tour: Tour,
    pub links: BTreeMap<ReferenceKind, Vec<LinkedReference>>,
}

impl TourDetails {
    pub fn links_of(&self, kind: ReferenceKind) -> &[LinkedReference] {
        self.links.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Target ids in position order.
    pub fn ids(&self, kind: ReferenceKind) -> Vec<i64> {
        let mut links: Vec<&LinkedReference> = self.links_of(kind).iter().collect();
        links.sort_by_key(|l| l.link.position);
        links.iter().map(|l| l.link.target_id).collect()
    }

    /// Legacy scalar view: the primary row's target.
    pub fn primary_id(&self, kind: ReferenceKind) -> Option<i64> {
        let links: Vec<AssociationLink> = self.links_of(kind).iter().map(|l| l.link).collect();
        primary_id(&links)
    }

    pub fn primary_item(&self, kind: ReferenceKind) -> Option<&ReferenceItem> {
        let id = self.primary_id(kind)?;
        self.links_of(kind)
            .iter()
            .find(|l| l.link.target_id == id)
            .and_then(|l| l.item.as_ref())
    }

    /// Draft copy of this tour, including every association in order.
    pub fn duplicate_draft(&self) -> (TourDraft, AssociationWrites) {
        let tour = &self.tour;
        let draft = TourDraft {
            title: tour.title.with_suffix(COPY_SUFFIX),
            description: tour.description.clone(),
            short_description: tour.short_description.clone(),
            price: tour.price,
            price_type: tour.price_type,
            duration_days: tour.duration_days,
            is_draft: true,
            services: tour.services.clone(),
            itinerary: tour.itinerary.clone(),
            images: tour.images.clone(),
            map_points: tour.map_points.clone(),
        };
        let writes = ReferenceKind::ALL
            .iter()
            .map(|kind| (*kind, AssociationWrite::Replace(self.ids(*kind))))
            .collect();
        (draft, writes)
    }

    /// Response object carrying both the join-row lists and the legacy
    /// single-value fields. Multilingual fields are left as objects; the
    /// shaper localizes them per request.
    pub fn to_response_value(&self) -> Value {
        let mut body = match serde_json::to_value(&self.tour) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        body.insert(
            "status".into(),
            Value::String(self.tour.status().to_string()),
        );

        for kind in ReferenceKind::ALL {
            let mut rows: Vec<&LinkedReference> = self.links_of(kind).iter().collect();
            rows.sort_by_key(|l| l.link.position);

            let list: Vec<Value> = rows
                .iter()
                .map(|linked| {
                    let mut row = Map::new();
                    row.insert(
                        format!("{}Id", kind.entity_key()),
                        Value::from(linked.link.target_id),
                    );
                    row.insert("isPrimary".into(), Value::Bool(linked.link.is_primary));
                    row.insert("position".into(), Value::from(linked.link.position));
                    row.insert(
                        kind.entity_key().into(),
                        linked
                            .item
                            .as_ref()
                            .and_then(|item| serde_json::to_value(item).ok())
                            .unwrap_or(Value::Null),
                    );
                    Value::Object(row)
                })
                .collect();

            body.insert(kind.links_key().into(), Value::Array(list));
            body.insert(
                kind.ids_key().into(),
                Value::from(self.ids(kind)),
            );

            if let Some(scalar_key) = kind.legacy_scalar_key() {
                body.insert(
                    scalar_key.into(),
                    self.primary_id(kind).map(Value::from).unwrap_or(Value::Null),
                );
                body.insert(
                    kind.entity_key().into(),
                    self.primary_item(kind)
                        .and_then(|item| serde_json::to_value(item).ok())
                        .unwrap_or(Value::Null),
                );
            }
        }

        Value::Object(body)
    }
}

/// Errors from the publish transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Tour is already published")]
    AlreadyPublished,

    #[error("Cannot publish tour, missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// Kinds a published tour must be linked to.
pub const REQUIRED_KINDS: [ReferenceKind; 3] = [
    ReferenceKind::Category,
    ReferenceKind::Country,
    ReferenceKind::City,
];

/// Required fields missing from a tour that is about to be published.
pub fn missing_required_fields(
    title: &MultilingualText,
    description: &MultilingualText,
    has_link: impl Fn(ReferenceKind) -> bool,
) -> Vec<String> {
    let mut missing = Vec::new();
    for lang in title.missing_languages() {
        missing.push(format!("title.{}", lang));
    }
    for lang in description.missing_languages() {
        missing.push(format!("description.{}", lang));
    }
    for kind in REQUIRED_KINDS {
        if !has_link(kind) {
            if let Some(key) = kind.legacy_scalar_key() {
                missing.push(key.to_string());
            }
        }
    }
    missing
}

/// Checks the `draft -> published` transition.
pub fn check_publishable(details: &TourDetails) -> Result<(), PublishError> {
    if !details.tour.is_draft {
        return Err(PublishError::AlreadyPublished);
    }
    let missing = missing_required_fields(&details.tour.title, &details.tour.description, |kind| {
        details.primary_id(kind).is_some()
    });
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PublishError::MissingFields(missing))
    }
}

/// Values for inserting a tour.
#[derive(Debug, Clone, PartialEq)]
pub struct TourDraft {
    pub title: MultilingualText,
    pub description: MultilingualText,
    pub short_description: Option<MultilingualText>,
    pub price: f64,
    pub price_type: PriceType,
    pub duration_days: i32,
    pub is_draft: bool,
    pub services: Vec<Value>,
    pub itinerary: Vec<Value>,
    pub images: Vec<Value>,
    pub map_points: Vec<MapPoint>,
}

/// Partial update of a tour row. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourChanges {
    pub title: Option<MultilingualText>,
    pub description: Option<MultilingualText>,
    pub short_description: Option<MultilingualText>,
    pub price: Option<f64>,
    pub price_type: Option<PriceType>,
    pub duration_days: Option<i32>,
    pub services: Option<Vec<Value>>,
    pub itinerary: Option<Vec<Value>>,
    pub images: Option<Vec<Value>>,
    pub map_points: Option<Vec<MapPoint>>,
}

/// Listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourListFilter {
    pub include_drafts: bool,
    pub country_id: Option<i64>,
    pub category_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for TourListFilter {
    fn default() -> Self {
        Self {
            include_drafts: false,
            country_id: None,
            category_id: None,
            limit: 20,
            offset: 0,
        }
    }
}

/// Tour create/update payload as submitted by the admin dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourPayload {
    pub title: Option<MultilingualText>,
    pub description: Option<MultilingualText>,
    pub short_description: Option<MultilingualText>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub price: Option<f64>,
    pub price_type: Option<PriceType>,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub duration_days: Option<i32>,
    pub is_draft: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_json_list")]
    pub services: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient::opt_json_list")]
    pub itinerary: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient::opt_json_list")]
    pub images: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient::opt_json_list")]
    pub map_points: Option<Vec<MapPoint>>,

    #[serde(default, alias = "countryIds", deserialize_with = "lenient::opt_id_list")]
    pub countries_ids: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub country_id: Option<i64>,
    #[serde(default, alias = "cityIds", deserialize_with = "lenient::opt_id_list")]
    pub cities_ids: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub city_id: Option<i64>,
    #[serde(default, alias = "categoryIds", deserialize_with = "lenient::opt_id_list")]
    pub categories_ids: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub category_id: Option<i64>,
    #[serde(default, alias = "hotelsIds", deserialize_with = "lenient::opt_id_list")]
    pub hotel_ids: Option<Vec<i64>>,
    #[serde(default, alias = "guidesIds", deserialize_with = "lenient::opt_id_list")]
    pub guide_ids: Option<Vec<i64>>,
    #[serde(default, alias = "driversIds", deserialize_with = "lenient::opt_id_list")]
    pub driver_ids: Option<Vec<i64>>,
    #[serde(default, alias = "blockIds", deserialize_with = "lenient::opt_id_list")]
    pub tour_block_ids: Option<Vec<i64>>,
}

impl TourPayload {
    /// Association writes for every kind, in `ReferenceKind::ALL` order.
    pub fn association_writes(&self) -> AssociationWrites {
        ReferenceKind::ALL
            .iter()
            .map(|kind| {
                let (ids, scalar) = match kind {
                    ReferenceKind::Country => (self.countries_ids.clone(), self.country_id),
                    ReferenceKind::City => (self.cities_ids.clone(), self.city_id),
                    ReferenceKind::Category => (self.categories_ids.clone(), self.category_id),
                    ReferenceKind::Hotel => (self.hotel_ids.clone(), None),
                    ReferenceKind::Guide => (self.guide_ids.clone(), None),
                    ReferenceKind::Driver => (self.driver_ids.clone(), None),
                    ReferenceKind::TourBlock => (self.tour_block_ids.clone(), None),
                };
                (*kind, AssociationWrite::from_payload(ids, scalar))
            })
            .collect()
    }

    fn check_values(&self) -> Result<(), String> {
        if let Some(price) = self.price {
            shared::validation::validate_price(price)
                .map_err(|_| "price must be a non-negative number".to_string())?;
        }
        if let Some(days) = self.duration_days {
            if !(1..=365).contains(&days) {
                return Err("durationDays must be between 1 and 365".to_string());
            }
        }
        if let Some(points) = &self.map_points {
            for (index, point) in points.iter().enumerate() {
                point
                    .validate()
                    .map_err(|_| format!("mapPoints[{}] has invalid coordinates", index))?;
            }
        }
        Ok(())
    }

    /// Validates a create payload. Drafts skip the required-field checks;
    /// published tours need every publish-required field.
    pub fn into_draft(self) -> Result<(TourDraft, AssociationWrites), String> {
        self.check_values()?;
        let is_draft = self.is_draft.unwrap_or(false);
        let writes = self.association_writes();
        let title = self.title.unwrap_or_default();
        let description = self.description.unwrap_or_default();

        if !is_draft {
            let missing = missing_required_fields(&title, &description, |kind| {
                writes
                    .iter()
                    .any(|(k, write)| *k == kind && !write.target_ids().is_empty())
            });
            if !missing.is_empty() {
                return Err(format!("Missing required fields: {}", missing.join(", ")));
            }
        }

        let draft = TourDraft {
            title,
            description,
            short_description: self.short_description,
            price: self.price.unwrap_or(0.0),
            price_type: self.price_type.unwrap_or_default(),
            duration_days: self.duration_days.unwrap_or(1),
            is_draft,
            services: self.services.unwrap_or_default(),
            itinerary: self.itinerary.unwrap_or_default(),
            images: self.images.unwrap_or_default(),
            map_points: self.map_points.unwrap_or_default(),
        };
        Ok((draft, writes))
    }

    /// Validates an update payload. Only the sent fields change, and the
    /// required-field rules are left to the publish action. `isDraft` is
    /// ignored: state changes go through publishing only.
    pub fn into_changes(self) -> Result<(TourChanges, AssociationWrites), String> {
        self.check_values()?;
        let writes = self.association_writes();

        let changes = TourChanges {
            title: self.title,
            description: self.description,
            short_description: self.short_description,
            price: self.price,
            price_type: self.price_type,
            duration_days: self.duration_days,
            services: self.services,
            itinerary: self.itinerary,
            images: self.images,
            map_points: self.map_points,
        };
        Ok((changes, writes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tour(is_draft: bool) -> Tour {
        Tour {
            id: 1,
            title: MultilingualText::new("Памир", "Pamir"),
            description: MultilingualText::new("Описание", "Description"),
            short_description: None,
            price: 1200.0,
            price_type: PriceType::PerPerson,
            duration_days: 7,
            is_draft,
            is_active: !is_draft,
            services: vec![json!("guide"), json!({"key": "transfer", "quantity": 2})],
            itinerary: vec![],
            images: vec![json!("/uploads/pamir.jpg")],
            map_points: vec![],
            rating: 4.5,
            reviews_count: 12,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn linked(target_id: i64, is_primary: bool, position: i32) -> LinkedReference {
        LinkedReference {
            link: AssociationLink {
                target_id,
                is_primary,
                position,
            },
            item: None,
        }
    }

    fn details(is_draft: bool) -> TourDetails {
        let mut links = BTreeMap::new();
        links.insert(ReferenceKind::Country, vec![linked(7, false, 1), linked(3, true, 0)]);
        links.insert(ReferenceKind::City, vec![linked(10, true, 0)]);
        links.insert(ReferenceKind::Category, vec![linked(2, true, 0)]);
        TourDetails {
            tour: sample_tour(is_draft),
            links,
        }
    }

    #[test]
    fn test_price_type_total() {
        assert_eq!(PriceType::PerPerson.total(100.0, 3), 300.0);
        assert_eq!(PriceType::PerGroup.total(100.0, 3), 100.0);
    }

    #[test]
    fn test_ids_follow_position_and_primary() {
        let details = details(true);
        assert_eq!(details.ids(ReferenceKind::Country), vec![3, 7]);
        assert_eq!(details.primary_id(ReferenceKind::Country), Some(3));
        assert_eq!(details.primary_id(ReferenceKind::Hotel), None);
    }

    #[test]
    fn test_response_value_has_both_shapes() {
        let value = details(true).to_response_value();
        assert_eq!(value["countryId"], json!(3));
        assert_eq!(value["cityId"], json!(10));
        assert_eq!(value["categoryId"], json!(2));
        assert_eq!(value["countriesIds"], json!([3, 7]));
        assert_eq!(value["tourCountries"][0]["countryId"], json!(3));
        assert_eq!(value["tourCountries"][0]["isPrimary"], json!(true));
        assert_eq!(value["tourCountries"][1]["isPrimary"], json!(false));
        assert_eq!(value["tourHotels"], json!([]));
        assert_eq!(value["status"], json!("draft"));
        assert_eq!(value["priceType"], json!("per_person"));
        assert!(value.get("hotelId").is_none());
    }

    #[test]
    fn test_publishable_draft() {
        assert_eq!(check_publishable(&details(true)), Ok(()));
    }

    #[test]
    fn test_publish_rejects_published() {
        assert_eq!(
            check_publishable(&details(false)),
            Err(PublishError::AlreadyPublished)
        );
    }

    #[test]
    fn test_publish_reports_missing_fields() {
        let mut details = details(true);
        details.tour.title.en = None;
        details.links.remove(&ReferenceKind::City);

        match check_publishable(&details) {
            Err(PublishError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["title.en".to_string(), "cityId".to_string()]);
            }
            other => panic!("Expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_draft() {
        let (draft, writes) = details(false).duplicate_draft();
        assert!(draft.is_draft);
        assert_eq!(draft.title.ru.as_deref(), Some("Памир (Copy)"));
        assert_eq!(draft.title.en.as_deref(), Some("Pamir (Copy)"));
        assert_eq!(draft.price, 1200.0);
        assert!(writes.contains(&(ReferenceKind::Country, AssociationWrite::Replace(vec![3, 7]))));
        assert!(writes.contains(&(ReferenceKind::Hotel, AssociationWrite::Replace(vec![]))));
    }

    #[test]
    fn test_draft_payload_needs_only_title() {
        let payload: TourPayload =
            serde_json::from_value(json!({"title": {"ru": "Черновик"}, "isDraft": true})).unwrap();
        let (draft, writes) = payload.into_draft().unwrap();
        assert!(draft.is_draft);
        assert_eq!(draft.duration_days, 1);
        assert!(writes.iter().all(|(_, w)| w.is_untouched()));
    }

    #[test]
    fn test_draft_payload_without_title_is_accepted() {
        let payload: TourPayload = serde_json::from_value(json!({"isDraft": true})).unwrap();
        let (draft, _) = payload.into_draft().unwrap();
        assert!(draft.is_draft);
        assert!(draft.title.is_blank());
    }

    #[test]
    fn test_published_payload_requires_everything() {
        let payload: TourPayload = serde_json::from_value(json!({
            "title": {"ru": "Тур", "en": "Tour"},
            "description": "{\"ru\":\"Описание\"}",
            "countriesIds": [1],
            "cityId": 4
        }))
        .unwrap();
        let err = payload.into_draft().unwrap_err();
        assert!(err.contains("description.en"));
        assert!(err.contains("categoryId"));
        assert!(!err.contains("countryId"));
        assert!(!err.contains("cityId"));
    }

    #[test]
    fn test_published_payload_accepts_form_encoding() {
        let payload: TourPayload = serde_json::from_value(json!({
            "title": "{\"ru\":\"Тур\",\"en\":\"Tour\"}",
            "description": {"ru": "Описание", "en": "Description"},
            "price": "950",
            "priceType": "per_group",
            "durationDays": "5",
            "services": "[\"guide\"]",
            "mapPoints": [{"lat": 38.56, "lng": 68.78}],
            "countriesIds": "[1]",
            "citiesIds": ["4"],
            "categoryId": 2
        }))
        .unwrap();
        let (draft, writes) = payload.into_draft().unwrap();
        assert!(!draft.is_draft);
        assert_eq!(draft.price, 950.0);
        assert_eq!(draft.price_type, PriceType::PerGroup);
        assert_eq!(draft.duration_days, 5);
        assert_eq!(draft.services, vec![json!("guide")]);
        assert!(writes.contains(&(ReferenceKind::Category, AssociationWrite::SetPrimary(2))));
        assert!(writes.contains(&(ReferenceKind::City, AssociationWrite::Replace(vec![4]))));
    }

    #[test]
    fn test_payload_rejects_bad_coordinates() {
        let payload: TourPayload = serde_json::from_value(json!({
            "title": "Тур",
            "isDraft": true,
            "mapPoints": [{"lat": 120.0, "lng": 68.0}]
        }))
        .unwrap();
        assert!(payload.into_draft().unwrap_err().contains("mapPoints[0]"));
    }

    #[test]
    fn test_update_can_clear_countries() {
        let payload: TourPayload = serde_json::from_value(json!({"countriesIds": []})).unwrap();
        let (_, writes) = payload.into_changes().unwrap();
        assert!(writes.contains(&(ReferenceKind::Country, AssociationWrite::Replace(vec![]))));
    }

    #[test]
    fn test_update_keeps_omitted_fields() {
        let payload: TourPayload = serde_json::from_value(json!({"price": 10})).unwrap();
        let (changes, writes) = payload.into_changes().unwrap();
        assert_eq!(changes.price, Some(10.0));
        assert!(changes.title.is_none());
        assert!(writes.iter().all(|(_, w)| w.is_untouched()));
    }
}
