//! HTTP routes and server startup.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::chat;
use super::types::HealthResponse;
use crate::agent::AgentSettings;
use crate::config::Config;
use crate::llm::{LlmClient, OpenAiCompatClient};
use crate::session::{InMemorySessionStore, SharedSessionStore};
use crate::tools::{ToolConnector, ToolSource};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SharedSessionStore,
    pub llm: Arc<dyn LlmClient>,
    pub tools: Arc<dyn ToolSource>,
}

impl AppState {
    /// Wire up the production collaborators for `config`.
    pub fn from_config(config: Config) -> Self {
        let llm = Arc::new(OpenAiCompatClient::new(
            config.api_key.clone(),
            config.llm_base_url.clone(),
        ));
        let tools = Arc::new(ToolConnector::new(
            config.tools.clone(),
            config.cocktail_api_base_url.clone(),
        ));
        Self {
            config,
            sessions: Arc::new(InMemorySessionStore::new()),
            llm,
            tools,
        }
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            model: self.config.default_model.clone(),
            instruction: self.config.instruction.clone(),
            max_iterations: self.config.max_iterations,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let index = static_dir.join("index.html");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route_service("/", ServeFile::new(index))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/api/health", get(health))
        .route("/ws/:session_id", get(chat::chat_ws))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Start the HTTP server and run until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    tracing::info!(
        model = %config.default_model,
        tools = %config.tools.transport,
        "Starting cocktail chat server"
    );

    let app = build_router(Arc::new(AppState::from_config(config)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
