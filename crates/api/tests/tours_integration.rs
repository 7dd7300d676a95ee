//! Integration tests for tour catalog endpoints.

mod common;

use axum::http::StatusCode;
use common::{booking_form, complete_tour, test_config, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_create_draft_needs_only_a_title() {
    let app = TestApp::new(test_config());

    let (status, body) = app
        .post(
            "/api/tours",
            json!({"title": {"ru": "Черновик"}, "isDraft": true}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Tour created");
    assert_eq!(body["data"]["isDraft"], true);
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(body["data"]["status"], "draft");
}

#[tokio::test]
async fn test_create_draft_without_title_is_accepted() {
    let app = TestApp::new(test_config());

    let (status, body) = app
        .post("/api/tours", json!({"title": {"ru": "  ", "en": ""}, "isDraft": true}))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["isDraft"], true);
    assert_eq!(body["data"]["title"], "");
}

#[tokio::test]
async fn test_list_hides_drafts_unless_requested() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let published = app.create_published_tour(&geo).await;
    app.create_tour(json!({"title": {"ru": "Черновик"}, "isDraft": true}))
        .await;

    let (status, body) = app.get("/api/tours").await;
    assert_eq!(status, StatusCode::OK);
    let tours = body["data"].as_array().unwrap();
    assert_eq!(tours.len(), 1);
    assert_eq!(tours[0]["id"], published);
    assert_eq!(body["pagination"]["total"], 1);

    let (_, body) = app.get("/api/tours?includeDrafts=true").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_list_pagination_and_filters() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    for _ in 0..3 {
        app.create_published_tour(&geo).await;
    }

    let (_, body) = app.get("/api/tours?limit=2&offset=1").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"], json!({"total": 3, "limit": 2, "offset": 1}));

    let (_, body) = app
        .get(&format!("/api/tours?countryId={}", geo.country_id))
        .await;
    assert_eq!(body["pagination"]["total"], 3);

    let (_, body) = app.get("/api/tours?categoryId=999999").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, body) = app.get("/api/tours?limit=5000").await;
    assert_eq!(body["pagination"]["limit"], 100);
}

#[tokio::test]
async fn test_get_unknown_tour_is_404() {
    let app = TestApp::new(test_config());

    let (status, body) = app.get("/api/tours/424242").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Tour not found"}));
}

#[tokio::test]
async fn test_non_numeric_id_is_400() {
    let app = TestApp::new(test_config());

    let (status, body) = app.get("/api/tours/pamir").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_update_changes_only_sent_fields() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let id = app.create_tour(complete_tour(&geo)).await;

    let (status, body) = app
        .put(&format!("/api/tours/{}", id), json!({"price": "199.5"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price"], 199.5);
    assert_eq!(body["data"]["title"], "Памирский тракт");
    assert_eq!(body["data"]["citiesIds"], json!([geo.city_id]));
}

#[tokio::test]
async fn test_update_published_tour_can_clear_cities() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let id = app.create_published_tour(&geo).await;

    let (status, body) = app
        .put(&format!("/api/tours/{}", id), json!({"citiesIds": []}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isDraft"], false);
    assert_eq!(body["data"]["cityId"], json!(null));
    assert_eq!(body["data"]["city"], json!(null));
}

#[tokio::test]
async fn test_update_unknown_tour_is_404() {
    let app = TestApp::new(test_config());

    let (status, _) = app
        .put("/api/tours/77", json!({"title": {"ru": "Новое"}}))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_tour_removes_it() {
    let app = TestApp::new(test_config());
    let id = app
        .create_tour(json!({"title": {"ru": "Удалить"}, "isDraft": true}))
        .await;

    let (status, body) = app.delete(&format!("/api/tours/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tour deleted");

    let (status, _) = app.get(&format!("/api/tours/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/api/tours/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_tour_with_bookings_is_conflict() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let id = app.create_published_tour(&geo).await;
    let (status, _) = app
        .post("/api/tours/booking-requests", booking_form(id, 2))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.delete(&format!("/api/tours/{}", id)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Tour has booking requests");
}

#[tokio::test]
async fn test_duplicate_creates_draft_copy() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let id = app.create_published_tour(&geo).await;

    let (status, body) = app
        .post(&format!("/api/tours/{}/duplicate?lang=en", id), json!({}))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let copy = &body["data"];
    assert_ne!(copy["id"], id);
    assert_eq!(copy["title"], "Pamir Highway (Copy)");
    assert_eq!(copy["isDraft"], true);
    assert_eq!(copy["countriesIds"], json!([geo.country_id]));
    assert_eq!(copy["cityId"], geo.city_id);
}

#[tokio::test]
async fn test_price_breakdown() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;

    let (status, _) = app
        .post(
            "/api/price-components",
            json!({
                "key": "jeep",
                "name": {"ru": "Джип", "en": "Jeep"},
                "price": 80,
                "unit": "day"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let mut tour = complete_tour(&geo);
    tour["services"] = json!(["jeep", {"key": "jeep", "quantity": 2}, "yurt"]);
    let id = app.create_tour(tour).await;

    let (status, body) = app
        .get(&format!("/api/tours/{}/price-breakdown?people=2&lang=en", id))
        .await;

    assert_eq!(status, StatusCode::OK);
    let breakdown = &body["data"];
    assert_eq!(breakdown["basePrice"], 240.0);
    assert_eq!(breakdown["lines"].as_array().unwrap().len(), 2);
    assert_eq!(breakdown["lines"][0]["name"], "Jeep");
    assert_eq!(breakdown["lines"][1]["amount"], 160.0);
    assert_eq!(breakdown["unknownKeys"], json!(["yurt"]));
    assert_eq!(breakdown["total"], 480.0);
}

#[tokio::test]
async fn test_price_breakdown_rejects_zero_people() {
    let app = TestApp::new(test_config());
    let id = app
        .create_tour(json!({"title": {"ru": "Тур"}, "isDraft": true}))
        .await;

    let (status, _) = app
        .get(&format!("/api/tours/{}/price-breakdown?people=0", id))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let app = TestApp::new(test_config());

    let (status, body) = app.get("/api/nowhere").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new(test_config());

    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["backend"], "memory");

    let (status, body) = app.get("/api/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, body) = app.get("/api/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}
