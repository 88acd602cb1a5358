use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    routing::{get, get_service, post},
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::api::{ApiError, ChatRequestBody, ChatResponseBody, ErrorBody};
use crate::config::AppConfig;
use crate::llm::{ChatCompletionsDriver, CompletionBackend, CompletionOrchestrator};
use crate::session::SessionStore;

/// Request body limit for chat payloads (client history included).
const BODY_LIMIT: usize = 1024 * 1024;

/// Build application state from configuration.
///
/// The completion backend is resolved once here: no API key means the
/// orchestrator runs without one and answers with the degraded notice.
pub fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
    let backend: Option<Arc<dyn CompletionBackend>> = match config.llm_settings() {
        Some(settings) => {
            let driver = ChatCompletionsDriver::new(settings)?;
            info!(
                name: "llm.config.loaded",
                url = %driver.url(),
                model = %config.llm.model,
                "Completion backend configured"
            );
            Some(Arc::new(driver))
        }
        None => {
            tracing::warn!(
                name: "llm.config.missing",
                "No API key configured, chat will answer in degraded mode"
            );
            None
        }
    };

    let sessions = SessionStore::new(config.session.max_history);
    let orchestrator = Arc::new(CompletionOrchestrator::new(
        backend,
        sessions,
        config.chat_defaults(),
    ));

    Ok(AppState {
        orchestrator,
        config,
    })
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let static_dir = Path::new(&state.config.server.static_dir).to_path_buf();
    let timeout = state.config.request_timeout();

    Router::new()
        .route("/", get_service(ServeFile::new(static_dir.join("index.html"))))
        .route("/health", get(health))
        .route("/chat", post(api_chat))
        .route("/api/chat", post(api_chat))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout, next.run(req)).await {
                    Ok(res) => res,
                    Err(_elapsed) => (
                        StatusCode::REQUEST_TIMEOUT,
                        Json(ErrorBody {
                            error: "request timed out".to_string(),
                        }),
                    )
                        .into_response(),
                }
            },
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config))?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        max_history = config.session.max_history,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!(name: "server.stopping", "Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /chat, POST /api/chat - Relay a message to the completion backend.
async fn api_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<Json<ChatResponseBody>, ApiError> {
    let Json(body) = body?;
    let input = body.into_input()?;
    let client_id = input.client_id.clone();

    tracing::debug!(
        client_id = %client_id,
        message_len = input.message.len(),
        client_history = input.history.as_ref().map(Vec::len),
        "Received chat request"
    );

    let outcome = state.orchestrator.respond(input).await?;
    Ok(Json(ChatResponseBody::from_outcome(client_id, &outcome)))
}

/// GET /health - Liveness check.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let backend = if state.orchestrator.has_backend() {
        "configured"
    } else {
        "missing"
    };
    Json(json!({
        "status": "ok",
        "backend": backend,
        "sessions": state.orchestrator.sessions().len(),
    }))
}
