//! The set of stores handed to the HTTP layer.

use domain::store::{BookingStore, PriceComponentStore, ReferenceStore, ReviewStore, TourStore};
use shared::retry::RetryPolicy;
use sqlx::PgPool;
use std::sync::Arc;

use crate::memory::InMemoryStore;
use crate::repositories::{
    BookingRepository, PriceComponentRepository, ReferenceRepository, ReviewRepository,
    TourRepository,
};

/// Trait objects for every store, plus the pool when Postgres backs them.
#[derive(Clone)]
pub struct Stores {
    pub tours: Arc<dyn TourStore>,
    pub references: Arc<dyn ReferenceStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub price_components: Arc<dyn PriceComponentStore>,
    pub pool: Option<PgPool>,
}

impl Stores {
    /// Postgres repositories sharing one pool and retry policy.
    pub fn postgres(pool: PgPool, retry: RetryPolicy) -> Self {
        Self {
            tours: Arc::new(TourRepository::new(pool.clone(), retry)),
            references: Arc::new(ReferenceRepository::new(pool.clone(), retry)),
            bookings: Arc::new(BookingRepository::new(pool.clone(), retry)),
            reviews: Arc::new(ReviewRepository::new(pool.clone(), retry)),
            price_components: Arc::new(PriceComponentRepository::new(pool.clone(), retry)),
            pool: Some(pool),
        }
    }

    /// A single in-memory store behind every trait.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            tours: store.clone(),
            references: store.clone(),
            bookings: store.clone(),
            reviews: store.clone(),
            price_components: store,
            pool: None,
        }
    }
}
