//! Booking request intake.

use domain::models::booking::{BookingRequest, CreateBookingRequest, NewBooking};
use domain::models::language::Lang;
use domain::models::tour::Tour;
use domain::services::notification::{booking_admin_alert, booking_confirmation, Mailer};
use domain::store::{BookingStore, TourStore};
use tracing::{info, warn};
use validator::Validate;

use crate::config::EmailConfig;
use crate::error::ApiError;
use crate::middleware::metrics::{record_booking_created, record_email_outcome};

/// Stores a booking request for an existing tour, then sends the admin
/// alert and the customer confirmation.
///
/// Mail failures are logged and counted but never fail the request. Returns
/// the stored booking and the tour it was made for.
pub async fn submit_booking(
    tours: &dyn TourStore,
    bookings: &dyn BookingStore,
    mailer: &dyn Mailer,
    email: &EmailConfig,
    request: CreateBookingRequest,
) -> Result<(BookingRequest, Tour), ApiError> {
    let submission = request.into_submission().map_err(ApiError::Validation)?;
    submission.validate()?;

    let tour = tours
        .find_tour(submission.tour_id)
        .await?
        .map(|details| details.tour)
        .ok_or_else(|| ApiError::NotFound("Tour not found".to_string()))?;

    let total_price = tour
        .price_type
        .total(tour.price, submission.number_of_people);
    let booking = bookings
        .create_booking(NewBooking {
            submission,
            total_price,
        })
        .await?;

    info!(
        booking_id = booking.id,
        tour_id = tour.id,
        people = booking.number_of_people,
        total_price = booking.total_price,
        "Booking request created"
    );
    record_booking_created();

    // Operator inbox sees titles in Russian, the site's default language.
    let title = tour.title.localize(Lang::default());

    if email.admin_email.trim().is_empty() {
        warn!(booking_id = booking.id, "No admin email configured, skipping alert");
    } else {
        let report = mailer
            .send(booking_admin_alert(&booking, &title, &email.admin_email))
            .await;
        if !report.success {
            warn!(booking_id = booking.id, reason = ?report.reason, "Admin alert not sent");
        }
        record_email_outcome("admin_alert", report.success);
    }

    let report = mailer.send(booking_confirmation(&booking, &title)).await;
    if !report.success {
        warn!(booking_id = booking.id, reason = ?report.reason, "Customer confirmation not sent");
    }
    record_email_outcome("customer_confirmation", report.success);

    Ok((booking, tour))
}
