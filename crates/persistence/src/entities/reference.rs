//! Reference entity and join row mappings.

use chrono::{DateTime, Utc};
use domain::models::association::AssociationLink;
use domain::models::multilingual::parse_field;
use domain::models::reference::{ReferenceItem, ReferenceKind};
use domain::models::tour::LinkedReference;
use serde_json::Value;
use sqlx::FromRow;

/// Database row mapping shared by every reference table.
#[derive(Debug, Clone, FromRow)]
pub struct ReferenceEntity {
    pub id: i64,
    pub name: Value,
    pub description: Option<Value>,
    pub address: Option<Value>,
    pub parent_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const REFERENCE_COLUMNS: &str =
    "id, name, description, address, parent_id, is_active, created_at, updated_at";

impl ReferenceEntity {
    pub fn into_item(self, kind: ReferenceKind) -> ReferenceItem {
        ReferenceItem {
            id: self.id,
            kind,
            name: parse_field(&self.name),
            description: self.description.as_ref().map(parse_field),
            address: self.address.as_ref().map(parse_field),
            parent_id: self.parent_id,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A join row with its reference entity left-joined in.
#[derive(Debug, Clone, FromRow)]
pub struct LinkEntity {
    pub tour_id: i64,
    pub target_id: i64,
    pub is_primary: bool,
    pub position: i32,
    pub ref_name: Option<Value>,
    pub ref_description: Option<Value>,
    pub ref_address: Option<Value>,
    pub ref_parent_id: Option<i64>,
    pub ref_is_active: Option<bool>,
    pub ref_created_at: Option<DateTime<Utc>>,
    pub ref_updated_at: Option<DateTime<Utc>>,
}

/// Selects join rows of `kind` for a set of tours, ordered by position.
pub fn link_select_sql(kind: ReferenceKind) -> String {
    format!(
        r#"
        SELECT j.tour_id, j.{column} AS target_id, j.is_primary, j.position,
               r.name AS ref_name, r.description AS ref_description,
               r.address AS ref_address,
               r.parent_id AS ref_parent_id, r.is_active AS ref_is_active,
               r.created_at AS ref_created_at, r.updated_at AS ref_updated_at
        FROM {join} j
        LEFT JOIN {table} r ON r.id = j.{column}
        WHERE j.tour_id = ANY($1)
        ORDER BY j.tour_id, j.position
        "#,
        column = kind.join_column(),
        join = kind.join_table(),
        table = kind.table(),
    )
}

impl LinkEntity {
    pub fn into_linked(self, kind: ReferenceKind) -> LinkedReference {
        let item = match (self.ref_name, self.ref_is_active, self.ref_created_at, self.ref_updated_at) {
            (Some(name), Some(is_active), Some(created_at), Some(updated_at)) => Some(ReferenceItem {
                id: self.target_id,
                kind,
                name: parse_field(&name),
                description: self.ref_description.as_ref().map(parse_field),
                address: self.ref_address.as_ref().map(parse_field),
                parent_id: self.ref_parent_id,
                is_active,
                created_at,
                updated_at,
            }),
            _ => None,
        };

        LinkedReference {
            link: AssociationLink {
                target_id: self.target_id,
                is_primary: self.is_primary,
                position: self.position,
            },
            item,
        }
    }
}
