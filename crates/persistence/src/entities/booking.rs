//! Booking request entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::booking::{BookingRequest, BookingStatus};
use sqlx::FromRow;

/// Database row mapping for the booking_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingEntity {
    pub id: i64,
    pub tour_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub preferred_date: NaiveDate,
    pub number_of_people: i32,
    pub notes: Option<String>,
    pub total_price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const BOOKING_COLUMNS: &str = "id, tour_id, customer_name, customer_email, customer_phone, \
     preferred_date, number_of_people, notes, total_price, status, created_at, updated_at";

impl From<BookingEntity> for BookingRequest {
    fn from(entity: BookingEntity) -> Self {
        let status = entity.status.parse().unwrap_or_else(|_| {
            tracing::warn!(
                booking_id = entity.id,
                status = %entity.status,
                "Unknown booking status in row, treating as pending"
            );
            BookingStatus::Pending
        });

        Self {
            id: entity.id,
            tour_id: entity.tour_id,
            customer_name: entity.customer_name,
            customer_email: entity.customer_email,
            customer_phone: entity.customer_phone,
            preferred_date: entity.preferred_date,
            number_of_people: entity.number_of_people,
            notes: entity.notes,
            total_price: entity.total_price,
            status,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
