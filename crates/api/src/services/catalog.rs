//! Checks that run before tour writes reach the store.

use domain::models::association::{
    cities_outside_countries, plan_links, AssociationLink, AssociationWrites, ReferentialPolicy,
};
use domain::models::reference::ReferenceKind;
use domain::models::tour::TourDetails;
use domain::store::ReferenceStore;
use tracing::warn;

use crate::error::ApiError;
use crate::middleware::metrics::record_referential_mismatch;

/// Ids linked for `kind` once `writes` are applied on top of `current`.
fn effective_ids(
    current: Option<&TourDetails>,
    writes: &AssociationWrites,
    kind: ReferenceKind,
) -> Vec<i64> {
    let existing: Vec<AssociationLink> = current
        .map(|details| details.links_of(kind).iter().map(|l| l.link).collect())
        .unwrap_or_default();

    let planned = writes
        .iter()
        .find(|(k, _)| *k == kind)
        .and_then(|(_, write)| plan_links(&existing, write));

    let mut rows = planned.unwrap_or(existing);
    rows.sort_by_key(|row| row.position);
    rows.into_iter().map(|row| row.target_id).collect()
}

/// Applies the referential policy to the cities and countries a tour will
/// have after the save.
///
/// Under `warn` a mismatch is logged and the save goes ahead; under
/// `reject` it fails with a validation error.
pub async fn check_city_membership(
    references: &dyn ReferenceStore,
    current: Option<&TourDetails>,
    writes: &AssociationWrites,
    policy: ReferentialPolicy,
) -> Result<(), ApiError> {
    let country_ids = effective_ids(current, writes, ReferenceKind::Country);
    let city_ids = effective_ids(current, writes, ReferenceKind::City);
    if country_ids.is_empty() || city_ids.is_empty() {
        return Ok(());
    }

    let cities = references
        .parent_ids(ReferenceKind::City, &city_ids)
        .await?;
    let outside = cities_outside_countries(&cities, &country_ids);
    if outside.is_empty() {
        return Ok(());
    }

    match policy {
        ReferentialPolicy::Warn => {
            warn!(
                tour_id = ?current.map(|d| d.tour.id),
                cities = ?outside,
                countries = ?country_ids,
                "Tour cities are outside its countries; saving anyway"
            );
            record_referential_mismatch("warn");
            Ok(())
        }
        ReferentialPolicy::Reject => {
            record_referential_mismatch("reject");
            let ids: Vec<String> = outside.iter().map(i64::to_string).collect();
            Err(ApiError::Validation(format!(
                "Cities {} do not belong to the selected countries",
                ids.join(", ")
            )))
        }
    }
}
