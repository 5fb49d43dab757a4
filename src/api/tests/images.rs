//! Tests for the image submission and status endpoints

use super::create_test_fetcher;
use crate::api::create_router;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_app() -> (Router, Arc<crate::ImageFetcher>, tempfile::TempDir) {
    let (fetcher, temp_dir) = create_test_fetcher().await;
    let app = create_router(fetcher.clone(), fetcher.get_config());
    (app, fetcher, temp_dir)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn submit_returns_poll_url() {
    let (app, _fetcher, _dir) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/images",
            serde_json::json!({"url": "http://example.com/cat.jpg"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let stored_url = json["storedUrl"].as_str().unwrap();
    assert!(
        stored_url.starts_with("/images/"),
        "expected poll locator, got {stored_url}"
    );
}

#[tokio::test]
async fn submit_invalid_url_is_400() {
    let (app, _fetcher, _dir) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/images",
            serde_json::json!({"url": "ftp://example.com/a.jpg"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn submit_empty_url_is_400() {
    let (app, _fetcher, _dir) = test_app().await;

    let response = app
        .oneshot(post_json("/images", serde_json::json!({"url": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_image_returns_pending_projection() {
    let (app, fetcher, _dir) = test_app().await;
    let receipt = fetcher.submit("http://example.com/a.jpg").await.unwrap();

    let response = app
        .oneshot(get(&format!("/images/{}", receipt.id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "pending");
    assert!(json.get("createdAt").is_some());
    assert!(json.get("storedUrl").is_none());
}

#[tokio::test]
async fn get_unknown_image_is_404() {
    let (app, _fetcher, _dir) = test_app().await;

    let response = app.oneshot(get("/images/424242")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "not_found");
    assert_eq!(json["error"]["details"]["image_id"], 424242);
}

#[tokio::test]
async fn get_non_numeric_id_is_client_error() {
    let (app, _fetcher, _dir) = test_app().await;

    let response = app.oneshot(get("/images/not-a-number")).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn list_images_empty_is_empty_array() {
    let (app, _fetcher, _dir) = test_app().await;

    let response = app.oneshot(get("/images")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn list_images_reflects_completed_retrieval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/done.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"png".to_vec())
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;

    let (app, fetcher, _dir) = test_app().await;
    let completed = fetcher
        .submit(&format!("{}/done.png", server.uri()))
        .await
        .unwrap();
    let pending = fetcher.submit("http://example.com/later.jpg").await.unwrap();

    fetcher.dispatch_pending().await.unwrap();
    fetcher.wait_for_in_flight().await;

    let response = app.oneshot(get("/images")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], completed.id.0);
    assert_eq!(entries[0]["status"], "completed");
    assert!(
        entries[0]["storedUrl"]
            .as_str()
            .unwrap()
            .ends_with(".png")
    );
    assert!(entries[0].get("finishedAt").is_some());
    // The pending record from example.com was dispatched too but cannot
    // resolve; either way it must not appear completed
    assert_eq!(entries[1]["id"], pending.id.0);
    assert_ne!(entries[1]["status"], "completed");
}

#[tokio::test]
async fn poll_url_round_trips_through_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rt.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"rt".to_vec()))
        .mount(&server)
        .await;

    let (app, fetcher, _dir) = test_app().await;

    // Submit through the API and follow the returned poll URL
    let response = app
        .clone()
        .oneshot(post_json(
            "/images",
            serde_json::json!({"url": format!("{}/rt.png", server.uri())}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let poll_url = json_body(response).await["storedUrl"]
        .as_str()
        .unwrap()
        .to_string();

    fetcher.dispatch_pending().await.unwrap();
    fetcher.wait_for_in_flight().await;

    let response = app.oneshot(get(&poll_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "completed");
    assert!(json["storedUrl"].as_str().unwrap().starts_with("http"));
}

#[tokio::test]
async fn submit_during_shutdown_is_503() {
    let (app, fetcher, _dir) = test_app().await;
    fetcher.shutdown().await;

    let response = app
        .oneshot(post_json(
            "/images",
            serde_json::json!({"url": "http://example.com/a.jpg"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "shutting_down");
}
