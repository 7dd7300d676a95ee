use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::models::reference::ReferenceKind;
use domain::services::notification::Mailer;
use persistence::Stores;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin_key, security_headers_middleware, trace_id,
};
use crate::routes::{bookings, health, price_components, references, reviews, tours};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub mailer: Arc<dyn Mailer>,
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

pub fn create_app(config: Config, stores: Stores, mailer: Arc<dyn Mailer>) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        config: config.clone(),
        stores,
        mailer,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Catalog management (X-Admin-Key when security.admin_api_key is set)
    let mut admin_routes = Router::new()
        .route("/api/tours", post(tours::create_tour))
        .route(
            "/api/tours/:id",
            put(tours::update_tour).delete(tours::delete_tour),
        )
        .route("/api/tours/:id/publish", post(tours::publish_tour))
        .route("/api/tours/:id/duplicate", post(tours::duplicate_tour))
        .route("/api/tours/reviews", get(reviews::list_reviews))
        .route("/api/tours/reviews/:id", put(reviews::moderate_review))
        .route(
            "/api/tours/booking-requests",
            get(bookings::list_booking_requests),
        )
        .route(
            "/api/tours/booking-requests/:id/status",
            put(bookings::update_booking_status),
        )
        .route(
            "/api/price-components",
            post(price_components::create_price_component),
        )
        .route(
            "/api/price-components/:key",
            put(price_components::update_price_component)
                .delete(price_components::delete_price_component),
        );

    // Public site (catalog reads, booking and review intake)
    let mut public_routes = Router::new()
        .route("/api/tours", get(tours::list_tours))
        .route("/api/tours/:id", get(tours::get_tour))
        .route(
            "/api/tours/:id/price-breakdown",
            get(tours::get_price_breakdown),
        )
        .route(
            "/api/tours/:id/reviews",
            get(reviews::list_tour_reviews).post(reviews::create_review),
        )
        .route(
            "/api/tours/booking-requests",
            post(bookings::create_booking_request),
        )
        .route(
            "/api/price-components",
            get(price_components::list_price_components),
        );

    for kind in ReferenceKind::ALL {
        public_routes = public_routes.merge(references::public_routes(kind));
        admin_routes = admin_routes.merge(references::admin_routes(kind));
    }

    let admin_routes = admin_routes.route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_admin_key,
    ));

    // Health and metrics
    let ops_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(ops_routes)
        .merge(public_routes)
        .merge(admin_routes)
        .fallback(route_not_found)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
