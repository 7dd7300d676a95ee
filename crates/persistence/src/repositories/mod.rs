//! Repository implementations for database operations.

pub mod booking;
pub mod price_component;
pub mod reference;
pub mod review;
pub mod tour;

pub use booking::BookingRepository;
pub use price_component::PriceComponentRepository;
pub use reference::ReferenceRepository;
pub use review::ReviewRepository;
pub use tour::TourRepository;
