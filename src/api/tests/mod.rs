use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;

mod images;

/// Helper to create a test ImageFetcher wrapped in Arc
async fn create_test_fetcher() -> (Arc<ImageFetcher>, tempfile::TempDir) {
    crate::service::test_helpers::create_test_service().await
}

#[tokio::test]
async fn api_server_spawns() {
    let (fetcher, _temp_dir) = create_test_fetcher().await;

    // Port 0 = OS assigns a free port
    let mut config = (*fetcher.get_config()).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let fetcher = fetcher.clone();
        let config = config.clone();
        async move { start_api_server(fetcher, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    api_handle.abort();
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (fetcher, _temp_dir) = create_test_fetcher().await;
    let config = fetcher.get_config();

    let app = create_router(fetcher, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (fetcher, _temp_dir) = create_test_fetcher().await;

    let mut config = (*fetcher.get_config()).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let config = Arc::new(config);

    let app = create_router(fetcher, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn openapi_json_endpoint_serves_valid_spec() {
    let (fetcher, _temp_dir) = create_test_fetcher().await;
    let config = fetcher.get_config();

    let app = create_router(fetcher, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert!(json["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(json["info"]["title"], "image-dl REST API");
    assert!(json["paths"].get("/images").is_some());
    assert!(json["paths"].get("/images/{id}").is_some());
}

#[tokio::test]
async fn swagger_ui_disabled_by_default() {
    let (fetcher, _temp_dir) = create_test_fetcher().await;
    let config = fetcher.get_config();
    assert!(!config.api.swagger_ui);

    let app = create_router(fetcher, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn server_starts_and_responds_over_tcp() {
    let (fetcher, _temp_dir) = create_test_fetcher().await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = fetcher.get_config();
    let server_fetcher = fetcher.clone();
    let server_handle = tokio::spawn(async move {
        let app = create_router(server_fetcher, config);
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["status"], "ok");

    server_handle.abort();
}
