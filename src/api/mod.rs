//! HTTP and WebSocket surface.

pub mod chat;
pub mod routes;
pub mod types;

pub use routes::{build_router, serve, AppState};
