//! Custom Axum extractors.

pub mod locale;
pub mod payload;

pub use locale::{Locale, LocaleQuery};
pub use payload::{ApiPath, ApiQuery, Payload};
