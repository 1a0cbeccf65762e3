#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use aims_api::config::ServerConfig;
use aims_api::router::build_app_router;
use aims_api::state::AppState;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults and no code lists.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        code_lists_path: None,
        max_batch_records: 50,
    }
}

/// Code lists covering the fixtures used across the API tests.
pub const CODE_LISTS_JSON: &str = r#"{
    "Currency": ["USD", "EUR", "GBP"],
    "TransactionType": ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13"],
    "Sector": ["14030", "12220"],
    "ResultType": ["1", "2", "3", "9"],
    "IndicatorMeasure": ["1", "2", "3", "4", "5"],
    "FileFormat": ["application/pdf"],
    "DocumentCategory": ["A01"]
}"#;

/// Write the fixture code lists to a unique temp file.
pub fn write_code_lists(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("aims-code-lists-{tag}-{}.json", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(CODE_LISTS_JSON.as_bytes()).unwrap();
    path
}

/// Full application router with the production middleware stack and no
/// code lists (degraded lookup).
pub fn build_test_app() -> Router {
    build_app_router(AppState::new(test_config()))
}

/// Application router with code lists loaded from a temp file.
pub fn build_test_app_with_code_lists(tag: &str) -> Router {
    let config = ServerConfig {
        code_lists_path: Some(write_code_lists(tag)),
        ..test_config()
    };
    build_app_router(AppState::new(config))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
