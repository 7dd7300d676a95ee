//! Tour review handlers.

use axum::{extract::State, http::HeaderMap};
use domain::models::review::{CreateReviewRequest, ModerateReviewRequest, Review, ReviewFilter};
use serde::Deserialize;
use shared::pagination::{clamp_limit, normalize_offset};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ApiQuery, Payload};
use crate::middleware::has_admin_access;
use crate::response::Envelope;
use crate::routes::truthy;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Admin review listing filter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReviewsQuery {
    pub tour_id: Option<i64>,
    pub moderated: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Reviews must target a tour the public can see.
async fn ensure_published_tour(
    state: &AppState,
    headers: &HeaderMap,
    tour_id: i64,
) -> Result<(), ApiError> {
    let visible = state
        .stores
        .tours
        .find_tour(tour_id)
        .await?
        .is_some_and(|details| {
            !details.tour.is_draft || has_admin_access(headers, &state.config.security)
        });

    if visible {
        Ok(())
    } else {
        Err(ApiError::NotFound("Tour not found".to_string()))
    }
}

/// Moderated reviews for one tour, newest first.
///
/// GET /api/tours/:id/reviews
pub async fn list_tour_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(tour_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Envelope<Vec<Review>>, ApiError> {
    ensure_published_tour(&state, &headers, tour_id).await?;

    let catalog = &state.config.catalog;
    let filter = ReviewFilter {
        tour_id: Some(tour_id),
        moderated: Some(true),
        limit: clamp_limit(query.limit, catalog.default_page_size, catalog.max_page_size),
        offset: normalize_offset(query.offset),
    };
    let reviews = state.stores.reviews.list_reviews(&filter).await?;
    Ok(Envelope::ok(reviews))
}

/// Submit a review. It stays hidden until moderated.
///
/// POST /api/tours/:id/reviews
pub async fn create_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiPath(tour_id): ApiPath<i64>,
    Payload(request): Payload<CreateReviewRequest>,
) -> Result<Envelope<Review>, ApiError> {
    let new = request.into_new(tour_id).map_err(ApiError::Validation)?;
    new.validate()?;
    ensure_published_tour(&state, &headers, tour_id).await?;

    let review = state.stores.reviews.create_review(new).await?;
    info!(review_id = review.id, tour_id, rating = review.rating, "Review submitted");

    Ok(Envelope::created(review).with_message("Review submitted for moderation"))
}

/// All reviews for the moderation queue.
///
/// GET /api/tours/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListReviewsQuery>,
) -> Result<Envelope<Vec<Review>>, ApiError> {
    let catalog = &state.config.catalog;
    let filter = ReviewFilter {
        tour_id: query.tour_id,
        moderated: query.moderated.as_deref().map(truthy),
        limit: clamp_limit(query.limit, catalog.default_page_size, catalog.max_page_size),
        offset: normalize_offset(query.offset),
    };
    let reviews = state.stores.reviews.list_reviews(&filter).await?;
    Ok(Envelope::ok(reviews))
}

/// Approve or hide a review. The tour's rating follows.
///
/// PUT /api/tours/reviews/:id
pub async fn moderate_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Payload(request): Payload<ModerateReviewRequest>,
) -> Result<Envelope<Review>, ApiError> {
    let review = state
        .stores
        .reviews
        .set_review_moderation(id, request.is_moderated)
        .await?;
    info!(
        review_id = id,
        tour_id = review.tour_id,
        is_moderated = review.is_moderated,
        "Review moderation changed"
    );

    Ok(Envelope::ok(review).with_message("Review updated"))
}
