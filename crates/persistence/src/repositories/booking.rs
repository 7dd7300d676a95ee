//! Booking request repository for database operations.

use async_trait::async_trait;
use domain::models::booking::{BookingFilter, BookingRequest, BookingStatus, NewBooking};
use domain::store::{BookingStore, StoreError, StoreResult};
use shared::retry::RetryPolicy;
use sqlx::PgPool;

use crate::entities::{BookingEntity, BOOKING_COLUMNS};
use crate::error::{store_error, with_db_retry};
use crate::metrics::QueryTimer;

/// Repository for booking request database operations.
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
    retry: RetryPolicy,
}

impl BookingRepository {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl BookingStore for BookingRepository {
    async fn create_booking(&self, new: NewBooking) -> StoreResult<BookingRequest> {
        let timer = QueryTimer::new("create_booking");
        let submission = new.submission;
        let row = sqlx::query_as::<_, BookingEntity>(&format!(
            r#"
            INSERT INTO booking_requests (tour_id, customer_name, customer_email, customer_phone,
                                          preferred_date, number_of_people, notes, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(submission.tour_id)
        .bind(&submission.customer_name)
        .bind(&submission.customer_email)
        .bind(&submission.customer_phone)
        .bind(submission.preferred_date)
        .bind(submission.number_of_people)
        .bind(&submission.notes)
        .bind(new.total_price)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error);
        timer.finish(&row);

        Ok(row?.into())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<BookingRequest>> {
        let timer = QueryTimer::new("list_bookings");
        let sql = format!(
            r#"
            SELECT {} FROM booking_requests
            WHERE ($1::VARCHAR IS NULL OR status = $1)
              AND ($2::BIGINT IS NULL OR tour_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            BOOKING_COLUMNS
        );
        let status = filter.status.map(|s| s.as_str());
        let rows = with_db_retry(&self.retry, "list_bookings", || {
            sqlx::query_as::<_, BookingEntity>(&sql)
                .bind(status)
                .bind(filter.tour_id)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&self.pool)
        })
        .await;
        timer.finish(&rows);

        Ok(rows?.into_iter().map(Into::into).collect())
    }

    async fn find_booking(&self, id: i64) -> StoreResult<Option<BookingRequest>> {
        let timer = QueryTimer::new("find_booking");
        let sql = format!("SELECT {} FROM booking_requests WHERE id = $1", BOOKING_COLUMNS);
        let row = with_db_retry(&self.retry, "find_booking", || {
            sqlx::query_as::<_, BookingEntity>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
        })
        .await;
        timer.finish(&row);

        Ok(row?.map(Into::into))
    }

    async fn set_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> StoreResult<BookingRequest> {
        let timer = QueryTimer::new("set_booking_status");
        let row = sqlx::query_as::<_, BookingEntity>(&format!(
            "UPDATE booking_requests SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error);
        timer.finish(&row);

        row?.map(Into::into)
            .ok_or_else(|| StoreError::NotFound("Booking request".to_string()))
    }
}
