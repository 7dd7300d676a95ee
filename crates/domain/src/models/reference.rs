//! Reference entities linked to tours: countries, cities, categories,
//! hotels, guides, drivers and tour blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::lenient;
use super::multilingual::MultilingualText;

/// Kind of reference entity. Each kind has its own table and its own join
/// table to tours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Country,
    City,
    Category,
    Hotel,
    Guide,
    Driver,
    TourBlock,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 7] = [
        ReferenceKind::Country,
        ReferenceKind::City,
        ReferenceKind::Category,
        ReferenceKind::Hotel,
        ReferenceKind::Guide,
        ReferenceKind::Driver,
        ReferenceKind::TourBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Country => "country",
            ReferenceKind::City => "city",
            ReferenceKind::Category => "category",
            ReferenceKind::Hotel => "hotel",
            ReferenceKind::Guide => "guide",
            ReferenceKind::Driver => "driver",
            ReferenceKind::TourBlock => "tour_block",
        }
    }

    /// Entity table.
    pub fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Country => "countries",
            ReferenceKind::City => "cities",
            ReferenceKind::Category => "categories",
            ReferenceKind::Hotel => "hotels",
            ReferenceKind::Guide => "guides",
            ReferenceKind::Driver => "drivers",
            ReferenceKind::TourBlock => "tour_blocks",
        }
    }

    /// Tour join table.
    pub fn join_table(&self) -> &'static str {
        match self {
            ReferenceKind::Country => "tour_countries",
            ReferenceKind::City => "tour_cities",
            ReferenceKind::Category => "tour_category_assignments",
            ReferenceKind::Hotel => "tour_hotels",
            ReferenceKind::Guide => "tour_guides",
            ReferenceKind::Driver => "tour_drivers",
            ReferenceKind::TourBlock => "tour_block_assignments",
        }
    }

    /// Foreign key column in the join table.
    pub fn join_column(&self) -> &'static str {
        match self {
            ReferenceKind::Country => "country_id",
            ReferenceKind::City => "city_id",
            ReferenceKind::Category => "category_id",
            ReferenceKind::Hotel => "hotel_id",
            ReferenceKind::Guide => "guide_id",
            ReferenceKind::Driver => "driver_id",
            ReferenceKind::TourBlock => "tour_block_id",
        }
    }

    /// URL segment under `/api`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ReferenceKind::Country => "countries",
            ReferenceKind::City => "cities",
            ReferenceKind::Category => "categories",
            ReferenceKind::Hotel => "hotels",
            ReferenceKind::Guide => "guides",
            ReferenceKind::Driver => "drivers",
            ReferenceKind::TourBlock => "tour-blocks",
        }
    }

    /// Key of the join-row list in tour responses.
    pub fn links_key(&self) -> &'static str {
        match self {
            ReferenceKind::Country => "tourCountries",
            ReferenceKind::City => "tourCities",
            ReferenceKind::Category => "tourCategoryAssignments",
            ReferenceKind::Hotel => "tourHotels",
            ReferenceKind::Guide => "tourGuides",
            ReferenceKind::Driver => "tourDrivers",
            ReferenceKind::TourBlock => "tourBlockAssignments",
        }
    }

    /// Key of the id array in tour payloads and responses.
    pub fn ids_key(&self) -> &'static str {
        match self {
            ReferenceKind::Country => "countriesIds",
            ReferenceKind::City => "citiesIds",
            ReferenceKind::Category => "categoriesIds",
            ReferenceKind::Hotel => "hotelIds",
            ReferenceKind::Guide => "guideIds",
            ReferenceKind::Driver => "driverIds",
            ReferenceKind::TourBlock => "tourBlockIds",
        }
    }

    /// Camel-case name of the nested entity in join rows and legacy fields.
    pub fn entity_key(&self) -> &'static str {
        match self {
            ReferenceKind::Country => "country",
            ReferenceKind::City => "city",
            ReferenceKind::Category => "category",
            ReferenceKind::Hotel => "hotel",
            ReferenceKind::Guide => "guide",
            ReferenceKind::Driver => "driver",
            ReferenceKind::TourBlock => "tourBlock",
        }
    }

    /// Legacy single-value field on tours, for kinds that had one.
    pub fn legacy_scalar_key(&self) -> Option<&'static str> {
        match self {
            ReferenceKind::Country => Some("countryId"),
            ReferenceKind::City => Some("cityId"),
            ReferenceKind::Category => Some("categoryId"),
            _ => None,
        }
    }

    /// Kind of the parent entity, if this kind has one.
    pub fn parent_kind(&self) -> Option<ReferenceKind> {
        match self {
            ReferenceKind::City => Some(ReferenceKind::Country),
            _ => None,
        }
    }

    /// Whether rows of this kind carry a multilingual street address.
    pub fn has_address(&self) -> bool {
        matches!(self, ReferenceKind::Hotel)
    }

    /// Human-readable singular name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ReferenceKind::Country => "Country",
            ReferenceKind::City => "City",
            ReferenceKind::Category => "Category",
            ReferenceKind::Hotel => "Hotel",
            ReferenceKind::Guide => "Guide",
            ReferenceKind::Driver => "Driver",
            ReferenceKind::TourBlock => "Tour block",
        }
    }
}

impl FromStr for ReferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReferenceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s || kind.path_segment() == s)
            .ok_or_else(|| format!("Unknown reference kind: {}", s))
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reference entity row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceItem {
    pub id: i64,
    #[serde(skip)]
    pub kind: ReferenceKind,
    pub name: MultilingualText,
    pub description: Option<MultilingualText>,
    /// Hotels only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<MultilingualText>,
    /// Parent entity id; a city's country.
    pub parent_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for reference listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFilter {
    pub parent_id: Option<i64>,
    pub include_inactive: bool,
}

/// Request payload for creating or updating a reference entity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePayload {
    pub name: Option<MultilingualText>,
    pub description: Option<MultilingualText>,
    pub address: Option<MultilingualText>,
    #[serde(default, alias = "countryId", deserialize_with = "lenient::opt_id")]
    pub parent_id: Option<i64>,
    pub is_active: Option<bool>,
}

/// Validated values for inserting a reference entity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReference {
    pub name: MultilingualText,
    pub description: Option<MultilingualText>,
    pub address: Option<MultilingualText>,
    pub parent_id: Option<i64>,
    pub is_active: bool,
}

/// Partial update of a reference entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceChanges {
    pub name: Option<MultilingualText>,
    pub description: Option<MultilingualText>,
    pub address: Option<MultilingualText>,
    pub parent_id: Option<i64>,
    pub is_active: Option<bool>,
}

impl ReferencePayload {
    /// Validates a create payload for `kind`. `address` is dropped for kinds
    /// that do not store one.
    pub fn into_new(self, kind: ReferenceKind) -> Result<NewReference, String> {
        let name = self
            .name
            .filter(|n| !n.is_blank())
            .ok_or_else(|| "name is required".to_string())?;

        if let Some(parent) = kind.parent_kind() {
            if self.parent_id.is_none() {
                return Err(format!("{}Id is required", parent.entity_key()));
            }
        }

        Ok(NewReference {
            name,
            description: self.description,
            address: self.address.filter(|_| kind.has_address()),
            parent_id: self.parent_id,
            is_active: self.is_active.unwrap_or(true),
        })
    }

    /// Validates an update payload for `kind`.
    pub fn into_changes(self, kind: ReferenceKind) -> Result<ReferenceChanges, String> {
        if let Some(name) = &self.name {
            if name.is_blank() {
                return Err("name must not be empty".to_string());
            }
        }
        Ok(ReferenceChanges {
            name: self.name,
            description: self.description,
            address: self.address.filter(|_| kind.has_address()),
            parent_id: self.parent_id,
            is_active: self.is_active,
        })
    }
}
