//! Bearer authentication, the authenticated-user guard, and the creative
//! routes behind them.

mod common;

use axum::http::{header, StatusCode};
use chrono::{Duration, Utc};
use common::TestApp;

fn today() -> String {
    Utc::now().date_naive().to_string()
}

#[tokio::test]
async fn test_every_response_varies_on_authorization() {
    let app = TestApp::new();

    let anonymous = app.get("/creatives/scheduled", None).await;
    let rejected = app.get("/creatives/scheduled", Some("Basic abc")).await;

    for response in [anonymous, rejected] {
        assert_eq!(response.headers[header::VARY], "Authorization");
    }
}

#[tokio::test]
async fn test_protected_route_without_header_is_401() {
    let app = TestApp::new();

    let response = app
        .upload(None, Some(&today()), Some(("banner.png", b"img")))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "Authentication required");
    assert!(app.mocks.creatives.all().is_empty());
}

#[tokio::test]
async fn test_anonymous_route_proceeds_without_header() {
    let app = TestApp::new();

    let response = app.get("/creatives/scheduled", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["scheduled_creatives"]["today"], serde_json::json!([]));
    assert_eq!(
        response.body["scheduled_creatives"]["tomorrow"],
        serde_json::json!([])
    );
}

#[tokio::test]
async fn test_malformed_headers_never_reach_storage() {
    let app = TestApp::new();

    for bad in [
        "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
        "Basic ABCDEFGHIJKLMNOPQRSTUVWXYZ",
        "Bearer short",
        "Bearer ABCDEFGHIJKLMNOPQRSTUVWXYZ trailing",
        "Bearer  ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    ] {
        let response = app.get("/creatives/scheduled", Some(bad)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "accepted {bad:?}");
        assert_eq!(response.body["error"], "Invalid authorization header");
    }

    assert_eq!(app.mocks.tokens.lookups(), 0);
}

#[tokio::test]
async fn test_unknown_token_is_401_after_lookup() {
    let app = TestApp::new();

    let response = app
        .get(
            "/creatives/scheduled",
            Some("Bearer ABCDEFGHIJKLMNOPQRSTUVWXYZ"),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Invalid authorization header");
    assert_eq!(app.mocks.tokens.lookups(), 1);
}

#[tokio::test]
async fn test_upload_creative_with_valid_token() {
    let app = TestApp::new();
    let (user, bearer) = app.signed_in_user("Ann", "9998887777").await;

    let response = app
        .upload(Some(&bearer), Some(&today()), Some(("banner.PNG", b"\x89PNG")))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let creative = &response.body["creative"];
    assert_eq!(creative["scheduled_at"], today());
    assert!(creative.get("user_id").is_none());
    assert!(creative["creative_url"].as_str().unwrap().ends_with(".png"));

    let stored = app.mocks.creatives.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].user_id, user.id);
    assert!(std::path::Path::new(&stored[0].creative_url).exists());
}

#[tokio::test]
async fn test_upload_rejects_past_date() {
    let app = TestApp::new();
    let (_, bearer) = app.signed_in_user("Ann", "9998887777").await;
    let yesterday = (Utc::now().date_naive() - Duration::days(1)).to_string();

    let response = app
        .upload(Some(&bearer), Some(&yesterday), Some(("banner.png", b"img")))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "cannot set scheduled_at before today");
    assert!(app.mocks.creatives.all().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let app = TestApp::new();
    let (_, bearer) = app.signed_in_user("Ann", "9998887777").await;

    let response = app
        .upload(Some(&bearer), Some(&today()), Some(("payload.exe", b"MZ")))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["error"],
        "invalid file type: only images are allowed"
    );
}

#[tokio::test]
async fn test_upload_requires_fields() {
    let app = TestApp::new();
    let (_, bearer) = app.signed_in_user("Ann", "9998887777").await;

    let no_date = app
        .upload(Some(&bearer), None, Some(("banner.png", b"img")))
        .await;
    assert_eq!(no_date.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_date.body["error"], "scheduled_at is required");

    let no_file = app.upload(Some(&bearer), Some(&today()), None).await;
    assert_eq!(no_file.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_file.body["error"], "file is required");

    let bad_date = app
        .upload(Some(&bearer), Some("tomorrow"), Some(("banner.png", b"img")))
        .await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_upload_is_413_with_generic_message() {
    let app = TestApp::new();
    let (_, bearer) = app.signed_in_user("Ann", "9998887777").await;
    let oversized = vec![b'x'; 11 << 20];

    let response = app
        .upload(Some(&bearer), Some(&today()), Some(("x.png", &oversized)))
        .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["success"], false);
    assert_eq!(
        response.body["error"],
        "file too large: uploads are limited to 10 MiB"
    );
    assert!(app.mocks.creatives.all().is_empty());
}

#[tokio::test]
async fn test_scheduled_lists_today_and_tomorrow() {
    let app = TestApp::new();
    let (_, bearer) = app.signed_in_user("Ann", "9998887777").await;
    let tomorrow = (Utc::now().date_naive() + Duration::days(1)).to_string();
    let next_week = (Utc::now().date_naive() + Duration::days(7)).to_string();

    for date in [today(), tomorrow.clone(), next_week] {
        let response = app
            .upload(Some(&bearer), Some(&date), Some(("banner.gif", b"GIF89a")))
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let response = app.get("/creatives/scheduled", Some(&bearer)).await;

    assert_eq!(response.status, StatusCode::OK);
    let scheduled = &response.body["scheduled_creatives"];
    assert_eq!(scheduled["today"].as_array().unwrap().len(), 1);
    assert_eq!(scheduled["tomorrow"].as_array().unwrap().len(), 1);
    assert_eq!(scheduled["tomorrow"][0]["scheduled_at"], tomorrow);
}

#[tokio::test]
async fn test_health_reports_healthy_with_in_memory_stores() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"]["status"], "ok");
    assert_eq!(response.body["cache"]["status"], "ok");
}
