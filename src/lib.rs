//! # Cocktail Chat
//!
//! A chat server that answers cocktail questions with an LLM agent backed by
//! TheCocktailDB.
//!
//! This library provides:
//! - A WebSocket endpoint that streams the agent's answers to a browser
//! - A tool-based agent loop over an OpenAI-compatible LLM API (Gemini by default)
//! - An MCP tool server wrapping TheCocktailDB, plus the client used to reach it
//! - Formatting of cocktail and ingredient records into readable text
//!
//! ## Architecture
//!
//! Each WebSocket connection gets a session and a tool connection:
//! 1. The client sends a message
//! 2. The agent streams a completion with the cocktail tools advertised
//! 3. Tool calls go to the `cocktail-mcp` server, results are fed back
//! 4. New text is relayed to the client as it arrives, then a completion frame
//!
//! ## Example
//!
//! ```rust,ignore
//! use cocktail_chat::{api, config::Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod cocktail;
pub mod config;
pub mod llm;
pub mod mcp;
pub mod session;
pub mod tools;

pub use config::Config;
