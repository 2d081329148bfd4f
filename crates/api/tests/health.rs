//! Health endpoint and middleware smoke tests.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get};

#[tokio::test]
async fn health_reports_ok_with_memory_store() {
    let app = build_test_app();
    let response = get(app.router(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store_healthy"], true);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = build_test_app();
    let response = get(app.router(), "/health").await;

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = build_test_app();
    let response = get(app.router(), "/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preflight_mirrors_any_capture_method() {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    let app = build_test_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/hook/demo")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "PROPFIND")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["access-control-allow-methods"],
        "PROPFIND"
    );
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}
