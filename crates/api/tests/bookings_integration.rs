//! Integration tests for booking request intake and administration.

mod common;

use axum::http::StatusCode;
use common::{booking_form, complete_tour, test_config, TestApp};
use domain::services::notification::MockMailer;
use serde_json::json;

#[tokio::test]
async fn test_booking_returns_201_with_localized_tour() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let tour_id = app.create_published_tour(&geo).await;

    let (status, body) = app
        .post("/api/tours/booking-requests?lang=en", booking_form(tour_id, 3))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["tourId"], tour_id);
    assert_eq!(data["status"], "pending");
    assert_eq!(data["numberOfPeople"], 3);
    assert_eq!(data["totalPrice"], 360.0);
    assert_eq!(data["preferredDate"], "2026-07-15");
    assert_eq!(data["tour"], json!({"id": tour_id, "title": "Pamir Highway"}));

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "ops@tajiktrails.test");
    assert_eq!(sent[1].to, data["customerEmail"].as_str().unwrap());
    assert!(sent[1].subject.contains("Памирский тракт"));
}

#[tokio::test]
async fn test_booking_survives_mail_failure() {
    let app = TestApp::with_mailer(test_config(), MockMailer::failing());
    let geo = app.seed_geography().await;
    let tour_id = app.create_published_tour(&geo).await;

    let (status, body) = app
        .post("/api/tours/booking-requests", booking_form(tour_id, 1))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tour"]["title"], "Памирский тракт");
}

#[tokio::test]
async fn test_booking_reports_first_missing_field() {
    let app = TestApp::new(test_config());

    let (status, body) = app
        .post(
            "/api/tours/booking-requests",
            json!({"customerEmail": "guest@example.com", "numberOfPeople": 2}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "customerName is required");

    let (status, body) = app
        .post(
            "/api/tours/booking-requests",
            json!({
                "customerName": "Guest",
                "customerEmail": "guest@example.com",
                "preferredDate": "2026-07-15",
                "numberOfPeople": 2
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tourId is required");
}

#[tokio::test]
async fn test_booking_validates_email_and_people() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let tour_id = app.create_published_tour(&geo).await;

    let mut form = booking_form(tour_id, 2);
    form["customerEmail"] = json!("not-an-email");
    let (status, body) = app.post("/api/tours/booking-requests", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email format");

    let (status, body) = app
        .post("/api/tours/booking-requests", booking_form(tour_id, 0))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("numberOfPeople"));

    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_booking_for_unknown_tour_is_404() {
    let app = TestApp::new(test_config());

    let (status, body) = app
        .post("/api/tours/booking-requests", booking_form(555_555, 2))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Tour not found");
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_booking_for_draft_tour_is_accepted() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let draft_id = app.create_tour(complete_tour(&geo)).await;

    let (status, body) = app
        .post("/api/tours/booking-requests", booking_form(draft_id, 2))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tourId"], draft_id);
    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn test_numeric_strings_are_accepted() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let tour_id = app.create_published_tour(&geo).await;

    let mut form = booking_form(tour_id, 1);
    form["tourId"] = json!(tour_id.to_string());
    form["numberOfPeople"] = json!("4");
    let (status, body) = app.post("/api/tours/booking-requests", form).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["numberOfPeople"], 4);
}

#[tokio::test]
async fn test_admin_lists_and_moves_bookings() {
    let app = TestApp::new(test_config());
    let geo = app.seed_geography().await;
    let tour_id = app.create_published_tour(&geo).await;

    let (_, first) = app
        .post("/api/tours/booking-requests", booking_form(tour_id, 2))
        .await;
    app.post("/api/tours/booking-requests", booking_form(tour_id, 5))
        .await;
    let booking_id = first["data"]["id"].as_i64().unwrap();

    let (status, body) = app.get("/api/tours/booking-requests").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let uri = format!("/api/tours/booking-requests/{}/status", booking_id);
    let (status, body) = app.put(&uri, json!({"status": "confirmed"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "confirmed");

    let (_, body) = app
        .get("/api/tours/booking-requests?status=confirmed")
        .await;
    let confirmed = body["data"].as_array().unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0]["id"], booking_id);

    let (status, body) = app.put(&uri, json!({"status": "pending"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Cannot change booking status from confirmed to pending"
    );
}

#[tokio::test]
async fn test_booking_status_errors() {
    let app = TestApp::new(test_config());

    let (status, _) = app
        .put(
            "/api/tours/booking-requests/404/status",
            json!({"status": "confirmed"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/tours/booking-requests?status=lost").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
