//! HTTP route handlers.

pub mod bookings;
pub mod health;
pub mod price_components;
pub mod references;
pub mod reviews;
pub mod tours;

use axum::http::HeaderMap;

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::middleware::{has_admin_access, ADMIN_KEY_HEADER};

pub use crate::extractors::locale::truthy;

/// Gate for admin-only views on public routes (`includeDrafts`,
/// `includeInactive`).
pub(crate) fn require_admin_view(
    headers: &HeaderMap,
    security: &SecurityConfig,
) -> Result<(), ApiError> {
    if has_admin_access(headers, security) {
        return Ok(());
    }
    if headers.contains_key(ADMIN_KEY_HEADER) {
        Err(ApiError::Unauthorized("Invalid admin key".to_string()))
    } else {
        Err(ApiError::Unauthorized("Admin key required".to_string()))
    }
}
