//! Domain services for the tour catalog.
//!
//! Services contain business logic that operates on domain models.

pub mod localization;
pub mod notification;

pub use localization::{shape_entity, shape_list, ShapeOptions};
pub use notification::{DeliveryReport, MailMessage, Mailer, MockMailer};
