//! Reference entity handlers: countries, cities, categories, hotels, guides,
//! drivers and tour blocks.
//!
//! Every kind shares the same handlers; the kind is bound when the routes
//! are built.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post, put},
    Router,
};
use domain::models::reference::{ReferenceFilter, ReferenceItem, ReferenceKind, ReferencePayload};
use domain::services::localization::{shape_entity, shape_list, ShapeOptions};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ApiQuery, Locale, Payload};
use crate::response::Envelope;
use crate::routes::{require_admin_view, truthy};

/// Listing filter. `countryId` is accepted for cities.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReferencesQuery {
    #[serde(alias = "countryId")]
    pub parent_id: Option<i64>,
    pub include_inactive: Option<String>,
}

/// Response object for one reference row. Cities also carry `countryId`.
fn reference_value(item: &ReferenceItem) -> Value {
    let mut value = serde_json::to_value(item).unwrap_or(Value::Null);
    if let (Some(parent), Value::Object(map)) = (item.kind.parent_kind(), &mut value) {
        map.insert(
            format!("{}Id", parent.entity_key()),
            item.parent_id.map(Value::from).unwrap_or(Value::Null),
        );
    }
    value
}

fn not_found(kind: ReferenceKind) -> ApiError {
    ApiError::NotFound(format!("{} not found", kind.display_name()))
}

async fn list(
    kind: ReferenceKind,
    state: AppState,
    options: ShapeOptions,
    headers: HeaderMap,
    query: ListReferencesQuery,
) -> Result<Envelope<Vec<Value>>, ApiError> {
    let include_inactive = query.include_inactive.as_deref().is_some_and(truthy);
    if include_inactive {
        require_admin_view(&headers, &state.config.security)?;
    }

    let filter = ReferenceFilter {
        parent_id: query.parent_id,
        include_inactive,
    };
    let items = state.stores.references.list_references(kind, &filter).await?;
    Ok(Envelope::ok(shape_list(items.iter().map(reference_value), options)))
}

async fn find(
    kind: ReferenceKind,
    state: AppState,
    options: ShapeOptions,
    id: i64,
) -> Result<Envelope<Value>, ApiError> {
    let item = state
        .stores
        .references
        .find_reference(kind, id)
        .await?
        .ok_or_else(|| not_found(kind))?;
    Ok(Envelope::ok(shape_entity(reference_value(&item), options)))
}

async fn create(
    kind: ReferenceKind,
    state: AppState,
    options: ShapeOptions,
    payload: ReferencePayload,
) -> Result<Envelope<Value>, ApiError> {
    let new = payload.into_new(kind).map_err(ApiError::Validation)?;
    let item = state.stores.references.create_reference(kind, new).await?;
    info!(kind = %kind, id = item.id, "Reference created");

    Ok(Envelope::created(shape_entity(reference_value(&item), options))
        .with_message(format!("{} created", kind.display_name())))
}

async fn update(
    kind: ReferenceKind,
    state: AppState,
    options: ShapeOptions,
    id: i64,
    payload: ReferencePayload,
) -> Result<Envelope<Value>, ApiError> {
    let changes = payload.into_changes(kind).map_err(ApiError::Validation)?;
    let item = state
        .stores
        .references
        .update_reference(kind, id, changes)
        .await?;
    info!(kind = %kind, id, "Reference updated");

    Ok(Envelope::ok(shape_entity(reference_value(&item), options))
        .with_message(format!("{} updated", kind.display_name())))
}

async fn remove(kind: ReferenceKind, state: AppState, id: i64) -> Result<Envelope<()>, ApiError> {
    if !state.stores.references.delete_reference(kind, id).await? {
        return Err(not_found(kind));
    }
    info!(kind = %kind, id, "Reference deleted");
    Ok(Envelope::message(format!("{} deleted", kind.display_name())))
}

/// Public read routes for `kind` under `/api/{segment}`.
pub fn public_routes(kind: ReferenceKind) -> Router<AppState> {
    let base = format!("/api/{}", kind.path_segment());
    Router::new()
        .route(
            &base,
            get(
                move |State(state): State<AppState>,
                      Locale(options): Locale,
                      headers: HeaderMap,
                      ApiQuery(query): ApiQuery<ListReferencesQuery>| async move {
                    list(kind, state, options, headers, query).await
                },
            ),
        )
        .route(
            &format!("{}/:id", base),
            get(
                move |State(state): State<AppState>,
                      Locale(options): Locale,
                      ApiPath(id): ApiPath<i64>| async move {
                    find(kind, state, options, id).await
                },
            ),
        )
}

/// Admin write routes for `kind`.
pub fn admin_routes(kind: ReferenceKind) -> Router<AppState> {
    let base = format!("/api/{}", kind.path_segment());
    Router::new()
        .route(
            &base,
            post(
                move |State(state): State<AppState>,
                      Locale(options): Locale,
                      Payload(payload): Payload<ReferencePayload>| async move {
                    create(kind, state, options, payload).await
                },
            ),
        )
        .route(
            &format!("{}/:id", base),
            put(
                move |State(state): State<AppState>,
                      Locale(options): Locale,
                      ApiPath(id): ApiPath<i64>,
                      Payload(payload): Payload<ReferencePayload>| async move {
                    update(kind, state, options, id, payload).await
                },
            )
            .delete(
                move |State(state): State<AppState>, ApiPath(id): ApiPath<i64>| async move {
                    remove(kind, state, id).await
                },
            ),
        )
}
