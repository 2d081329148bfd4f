#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use hookroom_core::clock::ManualClock;
use hookroom_core::fault::FaultPolicy;
use hookroom_core::memory::MemoryStore;
use tower::ServiceExt;

use hookroom_api::auth::jwt::{generate_access_token, JwtConfig};
use hookroom_api::config::{ServerConfig, StoreBackend, DEFAULT_MAX_BODY_BYTES};
use hookroom_api::router::build_app_router;
use hookroom_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        public_base_url: "http://hooks.test".to_string(),
        default_webhook_ttl_secs: 43_200,
        store_backend: StoreBackend::Memory,
        database_url: None,
        capture_sweep_interval_secs: 60,
        max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        fault_policy: FaultPolicy::default(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The full router over an in-memory store, plus handles for the test body.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
}

impl TestApp {
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers, using the
/// in-memory store and a manual clock.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::starting_now();
    let state = AppState::new(config, store.clone(), store, Arc::new(clock.clone()));
    let router = build_app_router(state.clone());
    TestApp {
        router,
        state,
        clock,
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn token_for(user_id: &str, role: &str, webhook_ttl: Option<i64>) -> String {
    generate_access_token(user_id, role, webhook_ttl, &test_config().jwt)
        .expect("token generation should succeed")
}

pub fn user_token(user_id: &str) -> String {
    token_for(user_id, "user", None)
}

pub fn admin_token(user_id: &str) -> String {
    token_for(user_id, "admin", None)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Send a request with an optional bearer token and optional JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, None).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Open `room_id` as `owner` and assert it succeeded.
pub async fn open_room(app: &TestApp, room_id: &str, owner: &str) {
    let response = post_auth(app.router(), &format!("/room/{room_id}"), &user_token(owner)).await;
    assert!(
        response.status().is_success(),
        "opening room {room_id} failed with {}",
        response.status()
    );
}
