//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod booking;
pub mod price_component;
pub mod reference;
pub mod review;
pub mod tour;

pub use booking::{BookingEntity, BOOKING_COLUMNS};
pub use price_component::{PriceComponentEntity, PRICE_COMPONENT_COLUMNS};
pub use reference::{link_select_sql, LinkEntity, ReferenceEntity, REFERENCE_COLUMNS};
pub use review::{ReviewEntity, REVIEW_COLUMNS};
pub use tour::{TourEntity, TOUR_COLUMNS};
