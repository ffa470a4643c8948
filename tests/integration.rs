mod common;

use std::sync::Arc;

use agent_tracker::api::rest::router;
use agent_tracker::models::agent::AgentRecord;
use agent_tracker::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(1024).unwrap());
    state.insert_agent(AgentRecord::new(
        "A1",
        "agent1",
        "password123",
        "John Doe",
        "+1234567890",
    ));
    state.insert_order(common::order("O1", "A1"));
    state.insert_order(common::order("O2", "A1"));
    state.insert_order(common::order("O3", "B7"));
    (router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn put_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["agents"], 1);
    assert_eq!(body["orders"], 3);
    assert_eq!(body["relay_connections"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("relay_connections"));
}

#[tokio::test]
async fn login_returns_profile_and_token() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "username": "agent1", "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], "A1");
    assert_eq!(body["username"], "agent1");
    assert_eq!(body["name"], "John Doe");
    assert_eq!(body["phone"], "+1234567890");
    assert_eq!(body["status"], "active");
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_with_wrong_password_returns_401() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "username": "agent1", "password": "wrong_password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_unknown_user_returns_401() {
    let (app, _state) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "username": "invalid_user", "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn assigned_orders_are_filtered_by_agent() {
    let (app, _state) = setup();
    let response = app
        .oneshot(get_request("/api/orders/assigned/A1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let mut ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|order| order["id"].as_str().unwrap())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["O1", "O2"]);
}

#[tokio::test]
async fn assigned_orders_for_unknown_agent_is_empty() {
    let (app, _state) = setup();
    let response = app
        .oneshot(get_request("/api/orders/assigned/nobody"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn order_detail_has_full_shape() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/api/orders/O1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["order_number"], "ORD001");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["pickup_location"]["lat"], 37.7749);
    assert_eq!(body["delivery_location"]["address"], "456 Broadway, Oakland, CA");
    assert_eq!(body["customer_info"]["name"], "Alice Johnson");
    assert!(body["started_at"].is_null());
}

#[tokio::test]
async fn get_nonexistent_order_returns_404() {
    let (app, _state) = setup();
    let response = app
        .oneshot(get_request("/api/orders/does-not-exist"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn start_then_complete_moves_forward() {
    let (app, _state) = setup();

    let res = app
        .clone()
        .oneshot(put_request("/api/orders/O1/start"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["message"], "Order started successfully");

    let res = app
        .clone()
        .oneshot(get_request("/api/orders/O1"))
        .await
        .unwrap();
    let order = body_json(res).await;
    assert_eq!(order["status"], "in_progress");
    assert!(order["started_at"].is_string());

    let res = app
        .clone()
        .oneshot(put_request("/api/orders/O1/complete"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["message"], "Order completed successfully");

    let res = app.oneshot(get_request("/api/orders/O1")).await.unwrap();
    let order = body_json(res).await;
    assert_eq!(order["status"], "completed");
    assert!(order["completed_at"].is_string());
}

#[tokio::test]
async fn complete_pending_order_returns_409() {
    let (app, state) = setup();
    let response = app
        .oneshot(put_request("/api/orders/O1/complete"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let order = state.orders.get("O1").unwrap();
    assert!(order.completed_at.is_none());
}

#[tokio::test]
async fn second_start_returns_409() {
    let (app, _state) = setup();

    let res = app
        .clone()
        .oneshot(put_request("/api/orders/O2/start"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(put_request("/api/orders/O2/start"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = body_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("in_progress"));
}

#[tokio::test]
async fn start_unknown_order_returns_404() {
    let (app, _state) = setup();
    let response = app
        .oneshot(put_request("/api/orders/nope/start"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn location_history_lists_recorded_samples() {
    let (app, state) = setup();
    let frame = json!({
        "event": "location_update",
        "data": { "lat": 37.78, "lng": -122.41, "order_id": "O1", "agent_id": "A1" }
    })
    .to_string();
    assert!(agent_tracker::api::rest::ws::handle_frame(&state, "sid", &frame).is_none());

    let res = app
        .clone()
        .oneshot(get_request("/api/orders/O1/locations"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let history = body_json(res).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["lat"], 37.78);

    let res = app
        .oneshot(get_request("/api/orders/missing/locations"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
