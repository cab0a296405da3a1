//! Model Context Protocol plumbing: the cocktail tool server and the client
//! the chat server uses to reach it.

mod client;
mod server;

pub use client::McpToolConnection;
pub use server::CocktailMcpServer;
