mod common;

use axum::http::StatusCode;

use common::{body_json, build_test_app, get, lazy_pool};

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = build_test_app(lazy_pool());
    let response = get(app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(lazy_pool());
    let response = get(app, "/api/v1/does-not-exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
