//! HTTP-level integration tests for webhook capture and retrieval.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_test_app, delete, get, open_room, post_json, send};
use serde_json::json;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

#[tokio::test]
async fn capture_list_delete_round_trip() {
    let app = build_test_app();
    open_room(&app, "demo", "alice").await;

    let response = post_json(app.router(), "/hook/demo", json!({"x": 1})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["method"], "POST");
    let receipt_id = json["data"]["receipt_id"].as_str().unwrap().to_string();

    let json = body_json(get(app.router(), "/hook/demo").await).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["body"], json!({"x": 1}));
    assert_eq!(items[0]["receipt_id"], receipt_id.as_str());

    let response = delete(app.router(), &format!("/hook/demo/{receipt_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "deleted");
    assert_eq!(json["data"]["room_id"], "demo");

    let json = body_json(get(app.router(), "/hook/demo").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let response = delete(app.router(), &format!("/hook/demo/{receipt_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "CAPTURE_NOT_FOUND");
}

#[tokio::test]
async fn capture_into_unknown_room_is_404() {
    let app = build_test_app();
    let response = post_json(app.router(), "/hook/ghost", json!({})).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "ROOM_NOT_FOUND");
}

#[tokio::test]
async fn every_non_get_method_is_captured() {
    let app = build_test_app();
    open_room(&app, "demo", "alice").await;

    for method in [Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS] {
        let response = send(app.router(), method.clone(), "/hook/demo", None, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{method} should be captured");
    }
    let response = send(app.router(), Method::HEAD, "/hook/demo", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(app.router(), "/hook/demo?sort=oldest").await).await;
    let methods: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["metadata"]["method"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(methods, vec!["PUT", "PATCH", "DELETE", "OPTIONS", "HEAD"]);
}

#[tokio::test]
async fn capture_records_request_metadata() {
    let app = build_test_app();
    open_room(&app, "demo", "alice").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/hook/demo?source=ci&tag=a&tag=b")
        .header("host", "hooks.example.com")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("user-agent", "sender/2.0")
        .header("x-forwarded-for", "198.51.100.7, 10.0.0.1")
        .body(Body::from("event=push&ref=main"))
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt_id = body_json(response).await["data"]["receipt_id"]
        .as_str()
        .unwrap()
        .to_string();

    let json = body_json(get(app.router(), &format!("/hook/demo/{receipt_id}")).await).await;
    let capture = &json["data"];
    assert_eq!(capture["body"], json!({"event": "push", "ref": "main"}));
    let metadata = &capture["metadata"];
    assert_eq!(metadata["method"], "POST");
    assert_eq!(
        metadata["url"],
        "http://hooks.example.com/hook/demo?source=ci&tag=a&tag=b"
    );
    assert_eq!(metadata["query"]["tag"], json!(["a", "b"]));
    assert_eq!(metadata["ip"], "198.51.100.7");
    assert_eq!(metadata["user_agent"], "sender/2.0");
    assert_eq!(metadata["host"], "hooks.example.com");
    assert_eq!(metadata["content_length"], 19);
}

#[tokio::test]
async fn non_json_body_is_stored_as_text() {
    let app = build_test_app();
    open_room(&app, "demo", "alice").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/hook/demo")
        .header("content-type", "text/plain")
        .body(Body::from("hello there"))
        .unwrap();
    app.router().oneshot(request).await.unwrap();

    let json = body_json(get(app.router(), "/hook/demo").await).await;
    assert_eq!(json["data"][0]["body"], "hello there");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = common::test_config();
    config.max_body_bytes = 16;
    let app = common::build_test_app_with(config);
    open_room(&app, "demo", "alice").await;

    let response = post_json(app.router(), "/hook/demo", json!({"padding": "x".repeat(64)})).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = body_json(get(app.router(), "/hook/demo").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_is_newest_first_by_default() {
    let app = build_test_app();
    open_room(&app, "demo", "alice").await;

    for n in 0..3 {
        post_json(app.router(), "/hook/demo", json!({"n": n})).await;
        app.clock.advance(chrono::Duration::seconds(1));
    }

    let json = body_json(get(app.router(), "/hook/demo").await).await;
    let order: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["body"]["n"].as_i64().unwrap())
        .collect();
    assert_eq!(order, vec![2, 1, 0]);
}

#[tokio::test]
async fn paginated_listing_returns_page_envelope() {
    let app = build_test_app();
    open_room(&app, "demo", "alice").await;
    for n in 0..5 {
        post_json(app.router(), "/hook/demo", json!({"n": n})).await;
    }

    let response = get(app.router(), "/hook/all/demo?page=1&limit=2&sort=oldest").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 5);
    assert_eq!(json["data"]["page"], 1);
    assert_eq!(json["data"]["limit"], 2);
    let order: Vec<_> = json["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["body"]["n"].as_i64().unwrap())
        .collect();
    assert_eq!(order, vec![0, 1]);
}

#[tokio::test]
async fn unparseable_receipt_id_is_capture_not_found() {
    let app = build_test_app();
    open_room(&app, "demo", "alice").await;

    let response = get(app.router(), "/hook/demo/not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "CAPTURE_NOT_FOUND");
}

#[tokio::test]
async fn expired_captures_disappear() {
    let app = build_test_app();
    let token = common::token_for("alice", "user", Some(60));
    common::post_auth(app.router(), "/room/demo", &token).await;
    post_json(app.router(), "/hook/demo", json!({})).await;

    app.clock.advance(chrono::Duration::seconds(59));
    let json = body_json(get(app.router(), "/hook/demo").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    app.clock.advance(chrono::Duration::seconds(1));
    let json = body_json(get(app.router(), "/hook/demo").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Clearing and isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clear_removes_every_capture() {
    let app = build_test_app();
    open_room(&app, "demo", "alice").await;
    for _ in 0..3 {
        post_json(app.router(), "/hook/demo", json!({})).await;
    }

    let response = delete(app.router(), "/hook/delete/demo").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "cleared");

    let json = body_json(get(app.router(), "/hook/demo").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let response = delete(app.router(), "/hook/delete/demo").await;
    assert_eq!(response.status(), StatusCode::OK, "clearing an empty room succeeds");
}

#[tokio::test]
async fn rooms_do_not_see_each_others_captures() {
    let app = build_test_app();
    open_room(&app, "a", "alice").await;
    open_room(&app, "b", "alice").await;

    let json = body_json(post_json(app.router(), "/hook/a", json!({"room": "a"})).await).await;
    let receipt_id = json["data"]["receipt_id"].as_str().unwrap().to_string();

    let json = body_json(get(app.router(), "/hook/b").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let response = get(app.router(), &format!("/hook/b/{receipt_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete(app.router(), &format!("/hook/b/{receipt_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(get(app.router(), "/hook/a").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn closing_a_room_drops_its_captures() {
    let app = build_test_app();
    open_room(&app, "demo", "alice").await;
    post_json(app.router(), "/hook/demo", json!({})).await;

    common::delete_auth(app.router(), "/room/demo", &common::user_token("alice")).await;

    let response = get(app.router(), "/hook/demo").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    open_room(&app, "demo", "alice").await;
    let json = body_json(get(app.router(), "/hook/demo").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn sweep_purges_expired_captures() {
    let app = build_test_app();
    let token = common::token_for("alice", "user", Some(60));
    common::post_auth(app.router(), "/room/demo", &token).await;
    post_json(app.router(), "/hook/demo", json!({})).await;

    let removed = hookroom_api::background::capture_sweep::sweep_once(
        &app.state.registry,
        app.state.captures.as_ref(),
    )
    .await
    .unwrap();
    assert_eq!(removed, 0);

    app.clock.advance(chrono::Duration::seconds(60));
    let removed = hookroom_api::background::capture_sweep::sweep_once(
        &app.state.registry,
        app.state.captures.as_ref(),
    )
    .await
    .unwrap();
    assert_eq!(removed, 1);
}
