//! Integration tests for the `X-Admin-Key` guard on administrative routes.

mod common;

use axum::http::{Method, StatusCode};
use common::{booking_form, complete_tour, guarded_config, request, Geography, TestApp, ADMIN_KEY};
use serde_json::{json, Value};

async fn admin(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    app.send(request(method, uri, body, Some(ADMIN_KEY))).await
}

async fn seed(app: &TestApp) -> Geography {
    let mut ids = Vec::new();
    for (segment, body) in [
        ("countries", json!({"name": {"ru": "Таджикистан", "en": "Tajikistan"}})),
        ("categories", json!({"name": {"ru": "Треккинг", "en": "Trekking"}})),
    ] {
        let (status, body) = admin(app, Method::POST, &format!("/api/{}", segment), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["data"]["id"].as_i64().unwrap());
    }
    let (_, city) = admin(
        app,
        Method::POST,
        "/api/cities",
        Some(json!({"name": {"ru": "Душанбе", "en": "Dushanbe"}, "countryId": ids[0]})),
    )
    .await;
    Geography {
        country_id: ids[0],
        city_id: city["data"]["id"].as_i64().unwrap(),
        category_id: ids[1],
    }
}

async fn admin_tour(app: &TestApp, geo: &Geography, publish: bool) -> i64 {
    let (status, body) = admin(app, Method::POST, "/api/tours", Some(complete_tour(geo))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();
    if publish {
        let uri = format!("/api/tours/{}/publish", id);
        let (status, _) = admin(app, Method::POST, &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }
    id
}

#[tokio::test]
async fn test_writes_require_admin_key() {
    let app = TestApp::new(guarded_config());

    let (status, body) = app
        .post("/api/countries", json!({"name": {"ru": "Таджикистан"}}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Admin key required");

    let (status, body) = app
        .send(request(
            Method::POST,
            "/api/countries",
            Some(json!({"name": {"ru": "Таджикистан"}})),
            Some("wrong-key"),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid admin key");

    let (status, _) = admin(
        &app,
        Method::POST,
        "/api/countries",
        Some(json!({"name": {"ru": "Таджикистан"}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_admin_only_routes_are_guarded() {
    let app = TestApp::new(guarded_config());

    for (method, uri) in [
        (Method::GET, "/api/tours/booking-requests"),
        (Method::GET, "/api/tours/reviews"),
        (Method::DELETE, "/api/tours/1"),
        (Method::POST, "/api/tours/1/publish"),
        (Method::DELETE, "/api/price-components/jeep"),
    ] {
        let (status, _) = app.send(request(method.clone(), uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_public_routes_stay_open() {
    let app = TestApp::new(guarded_config());
    let geo = seed(&app).await;
    let tour_id = admin_tour(&app, &geo, true).await;

    let (status, _) = app.get("/api/tours").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/tours/{}", tour_id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/countries").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/tours/booking-requests", booking_form(tour_id, 2))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            &format!("/api/tours/{}/reviews", tour_id),
            json!({"authorName": "Aziz", "rating": 5, "text": "Great"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_drafts_hidden_without_key() {
    let app = TestApp::new(guarded_config());
    let geo = seed(&app).await;
    let draft_id = admin_tour(&app, &geo, false).await;

    let (status, _) = app.get("/api/tours?includeDrafts=true").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = admin(&app, Method::GET, "/api/tours?includeDrafts=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], draft_id);

    let uri = format!("/api/tours/{}", draft_id);
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = admin(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "draft");

    let (status, _) = app.get("/api/guides?includeInactive=true").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = TestApp::new(guarded_config());

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        request(Method::GET, "/api/health", None, None),
    )
    .await
    .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
}
