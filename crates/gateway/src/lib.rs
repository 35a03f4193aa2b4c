//! HTTP API gateway for TaskMind.
//!
//! Exposes the chat API plus a health check:
//!
//! - `POST /api/{user_id}/chat`        — send a message, get the reply
//! - `POST /api/{user_id}/chat/stream` — send a message, get SSE events
//! - `GET  /api/{user_id}/conversations` — list the caller's conversations
//! - `GET  /api/{user_id}/conversations/{conversation_id}` — one transcript
//! - `GET  /health`                    — liveness plus a database probe
//!
//! Every `/api` route requires a bearer token; `/health` is open.
//!
//! Built on Axum. The gateway holds no per-conversation state: everything a
//! turn needs is loaded from the store, so any instance can serve any
//! request.

pub mod api;
pub mod auth;
pub mod error;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::Json;
use axum::routing::get;
use axum::{middleware, Router};
use serde::Serialize;
use std::sync::Arc;
use taskmind_agent::TurnRunner;
use taskmind_store::{HistoryManager, SqliteStore};
use tower_http::cors::CorsLayer;
use tracing::info;

use auth::AuthVerifier;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub runner: Arc<TurnRunner>,
    pub history: HistoryManager,
    pub store: Arc<SqliteStore>,
    pub verifier: AuthVerifier,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Security layers applied:
/// - Bearer token (HS256 JWT) authentication on all /api routes
/// - Per-handler owner checks against the path
/// - 1 MB request body cap
/// - CORS restricted to the frontend dev origin
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let protected = api::api_router(state.clone()).layer(middleware::from_fn_with_state(
        state.clone(),
        auth::authenticate,
    ));

    // The local frontend is the only expected browser origin.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::exact(
            "http://localhost:3000".parse().unwrap(),
        ))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
        .nest("/api", protected)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Builds the provider, store, tool catalog, and turn runner once; they are
/// shared across all requests via [`GatewayState`].
pub async fn start(config: taskmind_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let secret = config
        .auth
        .jwt_secret
        .clone()
        .ok_or("auth.jwt_secret is not set — run `taskmind onboard` or set TASKMIND_JWT_SECRET")?;

    let router = taskmind_providers::build_from_config(&config);
    let provider = router
        .default()
        .ok_or("No default provider configured — set an API key")?;
    let model = taskmind_providers::resolve_model(&config);

    let store = Arc::new(
        SqliteStore::connect(
            &config.database.path,
            std::time::Duration::from_secs(config.agent.db_timeout_secs),
        )
        .await?,
    );
    let catalog = Arc::new(taskmind_tools::ToolCatalog::new(store.clone()));

    let runner = Arc::new(
        TurnRunner::new(provider, catalog, &model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_tool_rounds(config.agent.max_tool_rounds)
            .with_reasoning_timeout(std::time::Duration::from_secs(
                config.agent.reasoning_timeout_secs,
            ))
            .with_tool_timeout(std::time::Duration::from_secs(config.agent.tool_timeout_secs)),
    );

    let state = Arc::new(GatewayState {
        runner,
        history: HistoryManager::new(store.clone(), config.agent.history_limit),
        store,
        verifier: AuthVerifier::new(&secret),
    });

    let app = build_router(state);

    info!(addr = %addr, model = %model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ── Health ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: String,
    version: &'static str,
}

/// Liveness plus a round-trip database probe. Always 200; the `database`
/// field carries the probe result so monitoring can tell a dead store from
/// a dead process.
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {e}"),
    };

    Json(HealthResponse {
        status: "healthy",
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}
