//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use persistence::db;
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub email_enabled: bool,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    /// `postgres` or `memory`.
    pub backend: String,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Simple status response for liveness and readiness checks.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

async fn check_database(state: &AppState) -> DatabaseHealth {
    match &state.stores.pool {
        Some(pool) => {
            let start = std::time::Instant::now();
            let connected = db::ping(pool).await.is_ok();
            let latency_ms = start.elapsed().as_millis() as u64;
            DatabaseHealth {
                backend: "postgres".to_string(),
                connected,
                latency_ms: connected.then_some(latency_ms),
            }
        }
        None => DatabaseHealth {
            backend: "memory".to_string(),
            connected: true,
            latency_ms: None,
        },
    }
}

/// Full health check endpoint.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let database = check_database(&state).await;

    if !database.connected {
        tracing::warn!("Health check failed: database unreachable");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        email_enabled: state.config.email.enabled,
    }))
}

/// Liveness endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness endpoint.
///
/// Returns 200 OK if the service can accept traffic (database connected).
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if check_database(&state).await.connected {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            database: DatabaseHealth {
                backend: "postgres".to_string(),
                connected: true,
                latency_ms: Some(5),
            },
            email_enabled: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["database"]["backend"], "postgres");
        assert_eq!(json["database"]["latency_ms"], 5);
        assert_eq!(json["email_enabled"], false);
    }

    #[tokio::test]
    async fn test_live() {
        let Json(response) = live().await;
        assert_eq!(response.status, "alive");
    }
}
