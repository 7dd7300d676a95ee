//! Tour associations (join rows) and their reconciliation.
//!
//! Join tables are the single stored representation of a tour's countries,
//! cities, categories and so on. The legacy scalar fields (`countryId`,
//! `cityId`, `categoryId`) are read from the primary row. Writes arrive in
//! either shape and are planned here into the complete set of rows to
//! persist, so the Postgres and in-memory stores apply identical rules.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::reference::ReferenceKind;

/// One join row between a tour and a reference entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationLink {
    pub target_id: i64,
    pub is_primary: bool,
    pub position: i32,
}

/// Requested change to one association kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationWrite {
    /// Field absent from the payload; rows are left as they are.
    Untouched,
    /// Replace all rows; the first id becomes primary. Empty clears.
    Replace(Vec<i64>),
    /// Only the legacy scalar was sent: upsert the primary row.
    SetPrimary(i64),
}

impl AssociationWrite {
    /// Builds the write from the array field and the legacy scalar field.
    /// The array wins when both are present.
    pub fn from_payload(ids: Option<Vec<i64>>, scalar: Option<i64>) -> Self {
        match (ids, scalar) {
            (Some(ids), _) => AssociationWrite::Replace(ids),
            (None, Some(id)) => AssociationWrite::SetPrimary(id),
            (None, None) => AssociationWrite::Untouched,
        }
    }

    pub fn is_untouched(&self) -> bool {
        matches!(self, AssociationWrite::Untouched)
    }

    /// Ids this write introduces.
    pub fn target_ids(&self) -> Vec<i64> {
        match self {
            AssociationWrite::Untouched => Vec::new(),
            AssociationWrite::Replace(ids) => ids.clone(),
            AssociationWrite::SetPrimary(id) => vec![*id],
        }
    }
}

/// Writes for every kind in one tour save.
pub type AssociationWrites = Vec<(ReferenceKind, AssociationWrite)>;

/// How city/country mismatches are handled on tour saves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferentialPolicy {
    /// Log a warning and save anyway.
    #[default]
    Warn,
    /// Reject the save with a validation error.
    Reject,
}

fn renumber(ids: impl IntoIterator<Item = i64>) -> Vec<AssociationLink> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .enumerate()
        .map(|(index, target_id)| AssociationLink {
            target_id,
            is_primary: index == 0,
            position: index as i32,
        })
        .collect()
}

/// Orders existing rows primary-first, then by position.
fn ordered(existing: &[AssociationLink]) -> Vec<AssociationLink> {
    let mut rows = existing.to_vec();
    rows.sort_by_key(|row| (!row.is_primary, row.position));
    rows
}

/// Computes the full row set after applying `write`, or `None` when the
/// rows must not be touched.
///
/// The result always has exactly one primary row at position 0 (unless
/// empty) and no duplicate targets.
pub fn plan_links(
    existing: &[AssociationLink],
    write: &AssociationWrite,
) -> Option<Vec<AssociationLink>> {
    match write {
        AssociationWrite::Untouched => None,
        AssociationWrite::Replace(ids) => Some(renumber(ids.iter().copied())),
        AssociationWrite::SetPrimary(id) => {
            let rows = ordered(existing);
            let others = rows
                .iter()
                .filter(|row| !row.is_primary)
                .map(|row| row.target_id);
            // The primary row keeps its slot but takes the new target.
            Some(renumber(std::iter::once(*id).chain(others)))
        }
    }
}

/// Target of the primary row.
pub fn primary_id(links: &[AssociationLink]) -> Option<i64> {
    links
        .iter()
        .find(|link| link.is_primary)
        .or_else(|| links.iter().min_by_key(|link| link.position))
        .map(|link| link.target_id)
}

/// Cities whose country is not among `country_ids`.
///
/// `cities` pairs each city id with its country. The check only applies
/// when both lists are non-empty.
pub fn cities_outside_countries(cities: &[(i64, Option<i64>)], country_ids: &[i64]) -> Vec<i64> {
    if cities.is_empty() || country_ids.is_empty() {
        return Vec::new();
    }
    cities
        .iter()
        .filter(|(_, country)| country.map_or(true, |c| !country_ids.contains(&c)))
        .map(|(city, _)| *city)
        .collect()
}
