//! API request and response types.

use serde::{Deserialize, Serialize};

/// Outbound WebSocket frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatFrame {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

impl ChatFrame {
    /// A piece of the assistant's answer.
    pub fn chunk(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            streaming: Some(true),
            complete: None,
            error: None,
        }
    }

    /// End of the answer to the current message.
    pub fn complete() -> Self {
        Self {
            message: String::new(),
            streaming: Some(false),
            complete: Some(true),
            error: None,
        }
    }

    /// A turn failed.
    pub fn error(reason: impl std::fmt::Display) -> Self {
        Self {
            message: format!("Error: {}", reason),
            streaming: None,
            complete: None,
            error: Some(true),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain strings and bools only, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
