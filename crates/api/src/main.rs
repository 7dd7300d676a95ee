use anyhow::{Context, Result};
use persistence::Stores;
use std::sync::Arc;
use tracing::{info, warn};

use tajik_trails_api::{app, config, middleware, services::EmailService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);

    info!("Starting Tajik Trails API v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = middleware::init_metrics() {
        warn!(error = %e, "Prometheus recorder not installed, /metrics disabled");
    }

    // Create database pool
    let pool = persistence::db::create_pool(&config.database)
        .await
        .context("Failed to connect to the database")?;

    // Run migrations
    persistence::db::run_migrations(&pool).await?;

    let stores = Stores::postgres(pool, config.catalog.retry_policy());

    let email = EmailService::new(config.email.clone());
    if !email.is_enabled() {
        warn!("Email delivery disabled; booking notifications will only be logged as failures");
    }

    // Build application
    let addr = config.socket_addr()?;
    let app = app::create_app(config, stores, Arc::new(email));

    // Start server
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
