pub mod audit;
pub mod auth;
pub mod completion;
pub mod error;
pub mod format;
pub mod handlers;
pub mod models;
pub mod state;
pub mod storage;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

// ═══════════════════════════════════════════════════════════════════════
//  Request correlation ID middleware
// ═══════════════════════════════════════════════════════════════════════

/// Middleware that generates a UUID v4 correlation ID for each request.
///
/// - Adds it to the current tracing span as `request_id`
/// - Returns it in the `X-Request-Id` response header
/// - Accepts an incoming `X-Request-Id` header to propagate from upstream
async fn request_id_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("request_id", &request_id.as_str());

    let mut response = next.run(req).await;

    if let Ok(header_value) = axum::http::HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

// ── OpenAPI documentation ────────────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GroqChat API",
        version = "1.0.0",
        description = "Multi-user chat backend proxying the Groq completion API",
        license(name = "MIT")
    ),
    paths(
        // Health
        handlers::health_check,
        handlers::readiness,
        // Auth
        handlers::register,
        handlers::login,
        handlers::logout,
        handlers::current_user,
        // Chats
        handlers::list_chats,
        handlers::create_chat,
        handlers::get_chat,
        handlers::delete_chat,
        handlers::rename_chat,
        // Messages
        handlers::list_messages,
        handlers::send_message,
        // Models
        handlers::list_models,
    ),
    components(schemas(
        models::PublicUser,
        models::RegisterRequest,
        models::LoginRequest,
        models::Chat,
        models::CreateChatRequest,
        models::RenameChatRequest,
        models::Message,
        models::SendMessageRequest,
        models::SendMessageResponse,
        models::Usage,
        models::HealthResponse,
        models::ProviderInfo,
    )),
    tags(
        (name = "health", description = "Health & readiness endpoints"),
        (name = "auth", description = "Registration, login, sessions"),
        (name = "chats", description = "Chat thread CRUD"),
        (name = "messages", description = "Message history & send"),
        (name = "models", description = "Provider model listing"),
    )
)]
pub struct ApiDoc;

/// Build the application router with the given shared state.
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a network port.
pub fn create_router(state: AppState) -> Router {
    // Message sends trigger an outbound provider call: 30 req/min
    // (1 per 2s burst 30)
    let rl_send = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(30)
        .finish()
        .expect("rate limiter config: send");
    // Other protected routes: 120 req/min (1 per 0.5s burst 120)
    let rl_default = GovernorConfigBuilder::default()
        .per_millisecond(500)
        .burst_size(120)
        .finish()
        .expect("rate limiter config: default");

    // ── Public routes (no session) ───────────────────────────────────
    let public = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/health/ready", get(handlers::readiness))
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login));

    // ── Protected: message send & history — 30 req/min ──────────────
    let message_routes = Router::new()
        .route(
            "/api/chats/{id}/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .layer(GovernorLayer::new(rl_send));

    // ── Protected: other routes — 120 req/min ───────────────────────
    let other_routes = Router::new()
        .route("/api/logout", post(handlers::logout))
        .route("/api/user", get(handlers::current_user))
        .route(
            "/api/chats",
            get(handlers::list_chats).post(handlers::create_chat),
        )
        .route(
            "/api/chats/{id}",
            get(handlers::get_chat)
                .patch(handlers::rename_chat)
                .delete(handlers::delete_chat),
        )
        .route("/api/models", get(handlers::list_models))
        .layer(GovernorLayer::new(rl_default));

    // ── Merge all protected routes with the auth gate ───────────────
    let protected = message_routes.merge(other_routes).route_layer(
        middleware::from_fn_with_state(state.clone(), auth::require_auth),
    );

    public
        .merge(protected)
        // Swagger UI — no auth required
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // 2 MB body limit — must be before .with_state() for Json extractor
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        // Request correlation ID — adds X-Request-Id header to every response
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}
