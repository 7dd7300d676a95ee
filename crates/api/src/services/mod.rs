//! Request-level workflows shared by route handlers.

pub mod booking;
pub mod catalog;
pub mod email;

pub use booking::submit_booking;
pub use catalog::check_city_membership;
pub use email::{EmailError, EmailService};
