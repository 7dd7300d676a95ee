//! Tour catalog handlers.

use axum::{extract::State, http::HeaderMap};
use domain::models::price_component::price_breakdown;
use domain::models::tour::{TourDetails, TourListFilter, TourPayload};
use domain::services::localization::{shape_entity, shape_list, ShapeOptions};
use serde::Deserialize;
use serde_json::Value;
use shared::pagination::{clamp_limit, normalize_offset};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ApiQuery, Locale, Payload};
use crate::middleware::has_admin_access;
use crate::middleware::metrics::record_tour_published;
use crate::response::Envelope;
use crate::routes::{require_admin_view, truthy};
use crate::services::check_city_membership;

/// Query parameters for the tour listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToursQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub include_drafts: Option<String>,
    pub country_id: Option<i64>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceBreakdownQuery {
    pub people: Option<i32>,
}

fn tour_value(details: &TourDetails, options: ShapeOptions) -> Value {
    shape_entity(details.to_response_value(), options)
}

fn tour_not_found() -> ApiError {
    ApiError::NotFound("Tour not found".to_string())
}

/// Loads a tour that the caller may see. Drafts are hidden from public
/// callers when the admin guard is on.
async fn visible_tour(
    state: &AppState,
    headers: &HeaderMap,
    id: i64,
) -> Result<TourDetails, ApiError> {
    let details = state
        .stores
        .tours
        .find_tour(id)
        .await?
        .ok_or_else(tour_not_found)?;

    if details.tour.is_draft && !has_admin_access(headers, &state.config.security) {
        return Err(tour_not_found());
    }
    Ok(details)
}

/// List tours.
///
/// GET /api/tours
pub async fn list_tours(
    State(state): State<AppState>,
    Locale(options): Locale,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<ListToursQuery>,
) -> Result<Envelope<Vec<Value>>, ApiError> {
    let include_drafts = query.include_drafts.as_deref().is_some_and(truthy);
    if include_drafts {
        require_admin_view(&headers, &state.config.security)?;
    }

    let catalog = &state.config.catalog;
    let filter = TourListFilter {
        include_drafts,
        country_id: query.country_id,
        category_id: query.category_id,
        limit: clamp_limit(query.limit, catalog.default_page_size, catalog.max_page_size),
        offset: normalize_offset(query.offset),
    };

    let (tours, total) = state.stores.tours.list_tours(&filter).await?;
    let data = shape_list(tours.iter().map(TourDetails::to_response_value), options);

    Ok(Envelope::ok(data).with_pagination(total, filter.limit, filter.offset))
}

/// Get a single tour.
///
/// GET /api/tours/:id
pub async fn get_tour(
    State(state): State<AppState>,
    Locale(options): Locale,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
) -> Result<Envelope<Value>, ApiError> {
    let details = visible_tour(&state, &headers, id).await?;
    Ok(Envelope::ok(tour_value(&details, options)))
}

/// Create a tour, as a draft or directly published.
///
/// POST /api/tours
pub async fn create_tour(
    State(state): State<AppState>,
    Locale(options): Locale,
    Payload(payload): Payload<TourPayload>,
) -> Result<Envelope<Value>, ApiError> {
    let (draft, links) = payload.into_draft().map_err(ApiError::Validation)?;
    check_city_membership(
        state.stores.references.as_ref(),
        None,
        &links,
        state.config.catalog.referential_policy,
    )
    .await?;

    let details = state.stores.tours.create_tour(draft, links).await?;
    info!(
        tour_id = details.tour.id,
        is_draft = details.tour.is_draft,
        "Tour created"
    );

    Ok(Envelope::created(tour_value(&details, options)).with_message("Tour created"))
}

/// Update a tour. Omitted fields and associations are left as they are.
///
/// PUT /api/tours/:id
pub async fn update_tour(
    State(state): State<AppState>,
    Locale(options): Locale,
    ApiPath(id): ApiPath<i64>,
    Payload(payload): Payload<TourPayload>,
) -> Result<Envelope<Value>, ApiError> {
    let current = state
        .stores
        .tours
        .find_tour(id)
        .await?
        .ok_or_else(tour_not_found)?;

    let (changes, links) = payload.into_changes().map_err(ApiError::Validation)?;
    check_city_membership(
        state.stores.references.as_ref(),
        Some(&current),
        &links,
        state.config.catalog.referential_policy,
    )
    .await?;

    let details = state.stores.tours.update_tour(id, changes, links).await?;
    info!(tour_id = id, "Tour updated");

    Ok(Envelope::ok(tour_value(&details, options)).with_message("Tour updated"))
}

/// Delete a tour with its associations and reviews.
///
/// DELETE /api/tours/:id
pub async fn delete_tour(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Envelope<()>, ApiError> {
    if !state.stores.tours.delete_tour(id).await? {
        return Err(tour_not_found());
    }
    info!(tour_id = id, "Tour deleted");
    Ok(Envelope::message("Tour deleted"))
}

/// Publish a draft tour.
///
/// POST /api/tours/:id/publish
pub async fn publish_tour(
    State(state): State<AppState>,
    Locale(options): Locale,
    ApiPath(id): ApiPath<i64>,
) -> Result<Envelope<Value>, ApiError> {
    let details = state.stores.tours.publish_tour(id).await??;
    info!(tour_id = id, "Tour published");
    record_tour_published();

    Ok(Envelope::ok(tour_value(&details, options)).with_message("Tour published"))
}

/// Copy a tour into a new draft with the same associations.
///
/// POST /api/tours/:id/duplicate
pub async fn duplicate_tour(
    State(state): State<AppState>,
    Locale(options): Locale,
    ApiPath(id): ApiPath<i64>,
) -> Result<Envelope<Value>, ApiError> {
    let source = state
        .stores
        .tours
        .find_tour(id)
        .await?
        .ok_or_else(tour_not_found)?;

    let (draft, links) = source.duplicate_draft();
    let details = state.stores.tours.create_tour(draft, links).await?;
    info!(source_id = id, tour_id = details.tour.id, "Tour duplicated");

    Ok(Envelope::created(tour_value(&details, options)).with_message("Tour duplicated"))
}

/// Tour price with its service components resolved.
///
/// GET /api/tours/:id/price-breakdown
pub async fn get_price_breakdown(
    State(state): State<AppState>,
    Locale(options): Locale,
    headers: HeaderMap,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PriceBreakdownQuery>,
) -> Result<Envelope<Value>, ApiError> {
    let people = query.people.unwrap_or(1);
    if people < 1 {
        return Err(ApiError::Validation("people must be at least 1".to_string()));
    }

    let details = visible_tour(&state, &headers, id).await?;
    let components = state.stores.price_components.list_price_components().await?;
    let breakdown = price_breakdown(&details.tour, &components, people);

    let value = serde_json::to_value(&breakdown)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize price breakdown: {}", e)))?;
    Ok(Envelope::ok(shape_entity(value, options)))
}
