//! Storage seams.
//!
//! Handlers depend on these traits only. The persistence crate provides a
//! Postgres implementation and an in-memory one used by tests and local
//! development without a database.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::association::AssociationWrites;
use crate::models::booking::{BookingFilter, BookingRequest, BookingStatus, NewBooking};
use crate::models::price_component::{NewPriceComponent, PriceComponent};
use crate::models::reference::{
    NewReference, ReferenceChanges, ReferenceFilter, ReferenceItem, ReferenceKind,
};
use crate::models::review::{NewReview, Review, ReviewFilter};
use crate::models::tour::{PublishError, TourChanges, TourDetails, TourDraft, TourListFilter};

/// Storage error taxonomy shared by every store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A write referenced a row that does not exist.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Transient failure; the operation may succeed if retried.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait TourStore: Send + Sync {
    async fn list_tours(&self, filter: &TourListFilter) -> StoreResult<(Vec<TourDetails>, i64)>;

    async fn find_tour(&self, id: i64) -> StoreResult<Option<TourDetails>>;

    /// Inserts the tour and its join rows in one transaction.
    async fn create_tour(
        &self,
        draft: TourDraft,
        links: AssociationWrites,
    ) -> StoreResult<TourDetails>;

    /// Applies column changes and reconciles join rows in one transaction.
    async fn update_tour(
        &self,
        id: i64,
        changes: TourChanges,
        links: AssociationWrites,
    ) -> StoreResult<TourDetails>;

    /// Runs the publish check and flips `is_draft` off and `is_active` on,
    /// all under the tour's row lock. The inner error is the rejected
    /// transition; the outer one is a storage failure.
    async fn publish_tour(&self, id: i64) -> StoreResult<Result<TourDetails, PublishError>>;

    /// Deletes the tour with its join rows and reviews. Returns false when
    /// no tour had that id.
    async fn delete_tour(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn list_references(
        &self,
        kind: ReferenceKind,
        filter: &ReferenceFilter,
    ) -> StoreResult<Vec<ReferenceItem>>;

    async fn find_reference(&self, kind: ReferenceKind, id: i64)
        -> StoreResult<Option<ReferenceItem>>;

    /// `(id, parent_id)` pairs for the given ids; unknown ids are omitted.
    async fn parent_ids(
        &self,
        kind: ReferenceKind,
        ids: &[i64],
    ) -> StoreResult<Vec<(i64, Option<i64>)>>;

    async fn create_reference(
        &self,
        kind: ReferenceKind,
        new: NewReference,
    ) -> StoreResult<ReferenceItem>;

    async fn update_reference(
        &self,
        kind: ReferenceKind,
        id: i64,
        changes: ReferenceChanges,
    ) -> StoreResult<ReferenceItem>;

    async fn delete_reference(&self, kind: ReferenceKind, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create_booking(&self, new: NewBooking) -> StoreResult<BookingRequest>;

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<BookingRequest>>;

    async fn find_booking(&self, id: i64) -> StoreResult<Option<BookingRequest>>;

    async fn set_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> StoreResult<BookingRequest>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn create_review(&self, new: NewReview) -> StoreResult<Review>;

    async fn list_reviews(&self, filter: &ReviewFilter) -> StoreResult<Vec<Review>>;

    /// Sets the moderation flag and recomputes the tour's rating and
    /// review count from its moderated reviews.
    async fn set_review_moderation(&self, id: i64, is_moderated: bool) -> StoreResult<Review>;
}

#[async_trait]
pub trait PriceComponentStore: Send + Sync {
    async fn list_price_components(&self) -> StoreResult<Vec<PriceComponent>>;

    /// Inserts or replaces the component with the same key.
    async fn upsert_price_component(&self, new: NewPriceComponent) -> StoreResult<PriceComponent>;

    async fn delete_price_component(&self, key: &str) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(StoreError::Unavailable("pool timed out".into()).is_transient());
        assert!(!StoreError::Backend("syntax".into()).is_transient());
        assert!(!StoreError::NotFound("Tour".into()).is_transient());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(StoreError::NotFound("Tour".into()).to_string(), "Tour not found");
    }
}
