//! Common test utilities for integration tests.
//!
//! Every test gets its own router over a fresh in-memory store, so tests
//! need no database and can run in parallel.

// Helpers are shared by several test binaries; each uses a subset.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use domain::services::notification::MockMailer;
use fake::{
    faker::{internet::en::SafeEmail, name::en::Name},
    Fake,
};
use persistence::db::DatabaseConfig;
use persistence::Stores;
use serde_json::{json, Value};
use std::sync::Arc;
use tajik_trails_api::{
    app::create_app,
    config::{
        CatalogConfig, Config, EmailConfig, LoggingConfig, SecurityConfig, ServerConfig,
    },
};
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "test-admin-key";

/// Configuration with the admin guard off and email disabled.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_size: 2_097_152,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 60,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig::default(),
        catalog: CatalogConfig::default(),
        email: EmailConfig {
            admin_email: "ops@tajiktrails.test".to_string(),
            ..Default::default()
        },
    }
}

/// Configuration with `X-Admin-Key` required on admin routes.
pub fn guarded_config() -> Config {
    let mut config = test_config();
    config.security.admin_api_key = ADMIN_KEY.to_string();
    config
}

/// Router plus handles for inspecting side effects.
pub struct TestApp {
    pub router: Router,
    pub mailer: MockMailer,
}

impl TestApp {
    pub fn new(config: Config) -> Self {
        Self::with_mailer(config, MockMailer::new())
    }

    pub fn with_mailer(config: Config, mailer: MockMailer) -> Self {
        let router = create_app(config, Stores::in_memory(), Arc::new(mailer.clone()));
        Self { router, mailer }
    }

    /// Sends a request and returns the status and parsed JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, None, None)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, Some(body), None)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::PUT, uri, Some(body), None)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, uri, None, None)).await
    }

    /// Creates a reference entity and returns its id.
    pub async fn create_reference(&self, segment: &str, body: Value) -> i64 {
        let (status, body) = self.post(&format!("/api/{}", segment), body).await;
        assert_eq!(status, StatusCode::CREATED, "create {}: {}", segment, body);
        body["data"]["id"].as_i64().unwrap()
    }

    /// Creates a country, a city inside it and a category.
    pub async fn seed_geography(&self) -> Geography {
        let country_id = self
            .create_reference(
                "countries",
                json!({"name": {"ru": "Таджикистан", "en": "Tajikistan"}}),
            )
            .await;
        let city_id = self
            .create_reference(
                "cities",
                json!({"name": {"ru": "Душанбе", "en": "Dushanbe"}, "countryId": country_id}),
            )
            .await;
        let category_id = self
            .create_reference(
                "categories",
                json!({"name": {"ru": "Треккинг", "en": "Trekking"}}),
            )
            .await;
        Geography {
            country_id,
            city_id,
            category_id,
        }
    }

    /// Creates a tour from `body` and returns its id.
    pub async fn create_tour(&self, body: Value) -> i64 {
        let (status, body) = self.post("/api/tours", body).await;
        assert_eq!(status, StatusCode::CREATED, "create tour: {}", body);
        body["data"]["id"].as_i64().unwrap()
    }

    /// Creates a complete tour and publishes it.
    pub async fn create_published_tour(&self, geo: &Geography) -> i64 {
        let id = self.create_tour(complete_tour(geo)).await;
        let (status, body) = self.post(&format!("/api/tours/{}/publish", id), json!({})).await;
        assert_eq!(status, StatusCode::OK, "publish: {}", body);
        id
    }
}

pub struct Geography {
    pub country_id: i64,
    pub city_id: i64,
    pub category_id: i64,
}

/// A tour payload that passes the publish check, saved as a draft.
pub fn complete_tour(geo: &Geography) -> Value {
    json!({
        "title": {"ru": "Памирский тракт", "en": "Pamir Highway"},
        "description": {"ru": "Дорога через горы", "en": "A road across the mountains"},
        "price": 120.0,
        "priceType": "per_person",
        "durationDays": 7,
        "isDraft": true,
        "countriesIds": [geo.country_id],
        "citiesIds": [geo.city_id],
        "categoriesIds": [geo.category_id]
    })
}

/// Booking form with generated customer details.
pub fn booking_form(tour_id: i64, people: i32) -> Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    json!({
        "customerName": name,
        "customerEmail": email,
        "customerPhone": "+992 900 000 000",
        "preferredDate": "2026-07-15",
        "numberOfPeople": people,
        "tourId": tour_id,
        "notes": "Vegetarian meals"
    })
}

/// Builds a request with an optional JSON body and admin key.
pub fn request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    admin_key: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = admin_key {
        builder = builder.header("X-Admin-Key", key);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
