//! Price calculator component handlers.

use axum::extract::State;
use domain::models::price_component::UpsertPriceComponentRequest;
use domain::services::localization::{shape_entity, shape_list};
use serde_json::Value;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, Locale, Payload};
use crate::response::Envelope;

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize price component: {}", e)))
}

/// GET /api/price-components
pub async fn list_price_components(
    State(state): State<AppState>,
    Locale(options): Locale,
) -> Result<Envelope<Vec<Value>>, ApiError> {
    let components = state.stores.price_components.list_price_components().await?;
    let values = components
        .iter()
        .map(to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Envelope::ok(shape_list(values, options)))
}

/// POST /api/price-components
pub async fn create_price_component(
    State(state): State<AppState>,
    Locale(options): Locale,
    Payload(request): Payload<UpsertPriceComponentRequest>,
) -> Result<Envelope<Value>, ApiError> {
    let new = request.into_new(None).map_err(ApiError::Validation)?;
    let component = state.stores.price_components.upsert_price_component(new).await?;
    info!(key = %component.key, price = component.price, "Price component saved");

    Ok(Envelope::created(shape_entity(to_value(&component)?, options))
        .with_message("Price component saved"))
}

/// PUT /api/price-components/:key
pub async fn update_price_component(
    State(state): State<AppState>,
    Locale(options): Locale,
    ApiPath(key): ApiPath<String>,
    Payload(request): Payload<UpsertPriceComponentRequest>,
) -> Result<Envelope<Value>, ApiError> {
    let new = request.into_new(Some(&key)).map_err(ApiError::Validation)?;
    let component = state.stores.price_components.upsert_price_component(new).await?;
    info!(key = %component.key, price = component.price, "Price component saved");

    Ok(Envelope::ok(shape_entity(to_value(&component)?, options))
        .with_message("Price component saved"))
}

/// DELETE /api/price-components/:key
pub async fn delete_price_component(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> Result<Envelope<()>, ApiError> {
    if !state.stores.price_components.delete_price_component(&key).await? {
        return Err(ApiError::NotFound("Price component not found".to_string()));
    }
    info!(key = %key, "Price component deleted");
    Ok(Envelope::message("Price component deleted"))
}
