//! Booking request handlers.

use axum::extract::State;
use domain::models::booking::{
    BookingFilter, BookingRequest, BookingStatus, CreateBookingRequest, UpdateBookingStatusRequest,
};
use domain::services::localization::shape_entity;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::pagination::{clamp_limit, normalize_offset};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ApiQuery, Locale, Payload};
use crate::response::Envelope;
use crate::services::submit_booking;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    pub status: Option<String>,
    pub tour_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Submit a booking request from the public site.
///
/// POST /api/tours/booking-requests
pub async fn create_booking_request(
    State(state): State<AppState>,
    Locale(options): Locale,
    Payload(request): Payload<CreateBookingRequest>,
) -> Result<Envelope<Value>, ApiError> {
    let (booking, tour) = submit_booking(
        state.stores.tours.as_ref(),
        state.stores.bookings.as_ref(),
        state.mailer.as_ref(),
        &state.config.email,
        request,
    )
    .await?;

    let mut data = serde_json::to_value(&booking)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize booking: {}", e)))?;
    data["tour"] = json!({
        "id": tour.id,
        "title": tour.title.to_value(),
    });

    Ok(Envelope::created(shape_entity(data, options))
        .with_message("Booking request submitted"))
}

/// Booking requests, newest first.
///
/// GET /api/tours/booking-requests
pub async fn list_booking_requests(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListBookingsQuery>,
) -> Result<Envelope<Vec<BookingRequest>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<BookingStatus>)
        .transpose()
        .map_err(ApiError::Validation)?;

    let catalog = &state.config.catalog;
    let filter = BookingFilter {
        status,
        tour_id: query.tour_id,
        limit: clamp_limit(query.limit, catalog.default_page_size, catalog.max_page_size),
        offset: normalize_offset(query.offset),
    };
    let bookings = state.stores.bookings.list_bookings(&filter).await?;
    Ok(Envelope::ok(bookings))
}

/// Move a booking request through its lifecycle.
///
/// PUT /api/tours/booking-requests/:id/status
pub async fn update_booking_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Payload(request): Payload<UpdateBookingStatusRequest>,
) -> Result<Envelope<BookingRequest>, ApiError> {
    let current = state
        .stores
        .bookings
        .find_booking(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking request not found".to_string()))?;

    if !current.status.can_transition_to(request.status) {
        return Err(ApiError::Validation(format!(
            "Cannot change booking status from {} to {}",
            current.status, request.status
        )));
    }

    let booking = state
        .stores
        .bookings
        .set_booking_status(id, request.status)
        .await?;
    info!(
        booking_id = id,
        from = %current.status,
        to = %booking.status,
        "Booking status changed"
    );

    Ok(Envelope::ok(booking).with_message("Booking status updated"))
}
