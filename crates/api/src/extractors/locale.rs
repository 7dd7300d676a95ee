//! Language and response-mode resolution from the query string.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use domain::models::language::Lang;
use domain::services::localization::ShapeOptions;
use serde::Deserialize;
use std::convert::Infallible;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleQuery {
    pub lang: Option<String>,
    pub include_raw: Option<String>,
}

/// Query-string boolean: `true` or `1`, case-insensitive.
pub fn truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

impl LocaleQuery {
    pub fn shape_options(&self) -> ShapeOptions {
        ShapeOptions {
            lang: Lang::resolve(self.lang.as_deref()),
            include_raw: self.include_raw.as_deref().map_or(false, truthy),
        }
    }
}

/// Shaping options for the current request. Never rejects: a missing or
/// unparsable query means Russian, public mode.
#[derive(Debug, Clone, Copy)]
pub struct Locale(pub ShapeOptions);

#[async_trait]
impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let query = Query::<LocaleQuery>::from_request_parts(parts, state)
            .await
            .map(|Query(q)| q)
            .unwrap_or_default();
        Ok(Locale(query.shape_options()))
    }
}
