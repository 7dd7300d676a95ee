//! Booking request domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::lenient;

// ============================================================================
// Booking Status
// ============================================================================

/// Status of a booking request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Check if an admin may move a booking to `target`.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        matches!(
            (self, target),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            _ => Err(format!(
                "Invalid booking status: {}. Must be one of: pending, confirmed, cancelled, completed",
                s
            )),
        }
    }
}

// ============================================================================
// Core Model
// ============================================================================

/// A stored booking request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub id: i64,
    pub tour_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub preferred_date: NaiveDate,
    pub number_of_people: i32,
    pub notes: Option<String>,
    pub total_price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for inserting a booking request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub submission: BookingSubmission,
    pub total_price: f64,
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Booking form as submitted from the public site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub preferred_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub number_of_people: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub tour_id: Option<i64>,
    pub notes: Option<String>,
}

/// A booking form with every required field present.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct BookingSubmission {
    #[validate(length(min = 1, max = 200, message = "customerName must be 1-200 characters"))]
    pub customer_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub customer_email: String,

    #[validate(length(max = 50, message = "customerPhone must be at most 50 characters"))]
    pub customer_phone: Option<String>,

    pub preferred_date: NaiveDate,

    #[validate(range(min = 1, max = 100, message = "numberOfPeople must be between 1 and 100"))]
    pub number_of_people: i32,

    pub tour_id: i64,

    #[validate(length(max = 2000, message = "notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_preferred_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

impl CreateBookingRequest {
    /// Checks required fields in form order and reports the first missing one.
    /// Format checks are left to [`Validate`] on the result.
    pub fn into_submission(self) -> Result<BookingSubmission, String> {
        let customer_name =
            present(self.customer_name).ok_or_else(|| "customerName is required".to_string())?;
        let customer_email =
            present(self.customer_email).ok_or_else(|| "customerEmail is required".to_string())?;
        let preferred_date =
            present(self.preferred_date).ok_or_else(|| "preferredDate is required".to_string())?;
        let number_of_people = self
            .number_of_people
            .ok_or_else(|| "numberOfPeople is required".to_string())?;
        let tour_id = self.tour_id.ok_or_else(|| "tourId is required".to_string())?;

        let preferred_date = parse_preferred_date(&preferred_date)
            .ok_or_else(|| "preferredDate must be a valid date (YYYY-MM-DD)".to_string())?;

        Ok(BookingSubmission {
            customer_name,
            customer_email,
            customer_phone: present(self.customer_phone),
            preferred_date,
            number_of_people,
            tour_id,
            notes: present(self.notes),
        })
    }
}

/// Admin status change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

/// Admin listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub tour_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}
