//! Admin guard for catalog-management routes.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::crypto::secrets_match;
use tracing::warn;

use crate::app::AppState;
use crate::config::SecurityConfig;
use crate::error::ApiError;

/// Header carrying the admin shared secret.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Whether the request may see admin-only data on a public route, such as
/// draft tours. Always true when the guard is off.
pub fn has_admin_access(headers: &HeaderMap, security: &SecurityConfig) -> bool {
    if !security.admin_guard_enabled() {
        return true;
    }
    headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| secrets_match(key, &security.admin_api_key))
}

/// Rejects the request with 401 unless `X-Admin-Key` matches
/// `security.admin_api_key`. Passes everything through when no key is
/// configured.
pub async fn require_admin_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let security = &state.config.security;
    if !security.admin_guard_enabled() {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(key) if secrets_match(key, &security.admin_api_key) => next.run(req).await,
        Some(_) => {
            warn!(path = %req.uri().path(), "Rejected admin request with wrong key");
            ApiError::Unauthorized("Invalid admin key".to_string()).into_response()
        }
        None => ApiError::Unauthorized("Admin key required".to_string()).into_response(),
    }
}
