use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use groqchat_backend::state::AppState;

/// Helper: build a fresh app router with a clean in-memory AppState.
/// Uses `connect_lazy` — no real database connection required, so these
/// tests only exercise paths that fail before issuing SQL.
fn app() -> axum::Router {
    let state = AppState::new_test();
    groqchat_backend::create_router(state)
}

/// Helper: collect a response body into a serde_json::Value.
async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
//  GET /api/health
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn health_returns_200() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_has_correct_fields() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;

    // new_test() doesn't call mark_ready(), so status is "starting"
    assert_eq!(json["status"], "starting");
    assert_eq!(json["version"], "1.0.0");
    assert_eq!(json["app"], "GroqChat");
    assert!(json["uptime_seconds"].is_u64());
    assert!(json["providers"].is_array());
}

#[tokio::test]
async fn readiness_returns_503_before_ready() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // new_test() does not call mark_ready(), so should be 503
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ═══════════════════════════════════════════════════════════════════════════
//  Auth gate — every resource route rejects cookieless requests with 401
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn protected_routes_require_a_session() {
    let chat_id = uuid::Uuid::new_v4();
    let routes: Vec<(&str, String)> = vec![
        ("GET", "/api/chats".to_string()),
        ("POST", "/api/chats".to_string()),
        ("GET", format!("/api/chats/{chat_id}")),
        ("PATCH", format!("/api/chats/{chat_id}")),
        ("DELETE", format!("/api/chats/{chat_id}")),
        ("GET", format!("/api/chats/{chat_id}/messages")),
        ("POST", format!("/api/chats/{chat_id}/messages")),
        ("POST", "/api/logout".to_string()),
        ("GET", "/api/user".to_string()),
        ("GET", "/api/models".to_string()),
    ];

    for (method, uri) in routes {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(&uri)
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should be gated"
        );
    }
}

#[tokio::test]
async fn cookieless_rejection_has_the_standard_error_body() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/chats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Authentication required");
}

// ═══════════════════════════════════════════════════════════════════════════
//  POST /api/register — validation
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn register_rejects_blank_username() {
    let body = json!({ "username": "   ", "password": "secret1" });
    let response = app().oneshot(json_post("/api/register", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("Username"));
}

#[tokio::test]
async fn register_rejects_blank_password() {
    let body = json!({ "username": "alice", "password": "  " });
    let response = app().oneshot(json_post("/api/register", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("Password"));
}

#[tokio::test]
async fn register_rejects_overlong_username() {
    let body = json!({ "username": "x".repeat(65), "password": "secret1" });
    let response = app().oneshot(json_post("/api/register", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ═══════════════════════════════════════════════════════════════════════════
//  POST /api/login — validation
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn login_rejects_blank_credentials() {
    for body in [
        json!({ "username": "", "password": "secret1" }),
        json!({ "username": "alice", "password": "" }),
    ] {
        let response = app().oneshot(json_post("/api/login", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Misc
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn incoming_request_id_is_propagated() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("x-request-id", "test-correlation-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-correlation-id"
    );
}
