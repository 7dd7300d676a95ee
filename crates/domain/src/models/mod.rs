//! Domain models for the tour catalog.

pub mod association;
pub mod booking;
pub mod language;
pub mod lenient;
pub mod multilingual;
pub mod price_component;
pub mod reference;
pub mod review;
pub mod tour;

pub use association::{AssociationLink, AssociationWrite, AssociationWrites, ReferentialPolicy};
pub use booking::{BookingRequest, BookingStatus};
pub use language::Lang;
pub use multilingual::{MultilingualText, StoredText};
pub use price_component::PriceComponent;
pub use reference::{ReferenceItem, ReferenceKind};
pub use review::Review;
pub use tour::{Tour, TourDetails};
