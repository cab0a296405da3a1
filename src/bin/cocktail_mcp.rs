//! Cocktail MCP server - stdio entry point
//!
//! Spawned by the chat server for each session. stdout carries the MCP
//! protocol, so logs go to stderr.

use cocktail_chat::cocktail::{CocktailDbClient, CocktailToolbox, DEFAULT_API_BASE_URL};
use cocktail_chat::mcp::CocktailMcpServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cocktail_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    let base_url = std::env::var("COCKTAIL_API_BASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    let client = CocktailDbClient::new(&base_url)?;
    CocktailMcpServer::new(CocktailToolbox::new(client)).run().await
}
