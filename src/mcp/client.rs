//! MCP client side of the tool connection.

use std::path::Path;

use async_trait::async_trait;
use rmcp::{
    model::CallToolRequestParams,
    service::{Peer, RunningService},
    transport::TokioChildProcess,
    RoleClient, ServiceExt,
};
use serde_json::{json, Value};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::tools::{ToolConnection, ToolDescriptor};

/// A live MCP session with a tool server.
///
/// Holds the running service so that [`close`](ToolConnection::close) can shut
/// it down (and with it the server subprocess).
pub struct McpToolConnection {
    label: String,
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
}

impl McpToolConnection {
    /// Spawn `command` and perform the MCP handshake over its stdio.
    pub async fn spawn(
        command: &Path,
        args: &[String],
        env: &[(&str, &str)],
    ) -> anyhow::Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args).envs(env.iter().copied());
        let transport = TokioChildProcess::new(cmd)
            .map_err(|e| anyhow::anyhow!("Failed to start {}: {}", command.display(), e))?;

        let service: RunningService<RoleClient, ()> = ().serve(transport).await.map_err(|e| {
            anyhow::anyhow!("MCP handshake with {} failed: {}", command.display(), e)
        })?;
        tracing::info!("Connected to tool server {}", command.display());

        Ok(Self::from_service(command.display().to_string(), service))
    }

    /// Wrap an already initialized client service.
    pub fn from_service(label: impl Into<String>, service: RunningService<RoleClient, ()>) -> Self {
        Self {
            label: label.into(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
        }
    }
}

#[async_trait]
impl ToolConnection for McpToolConnection {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        let tools = self.peer.list_all_tools().await?;
        tools
            .iter()
            .map(|tool| descriptor_from_json(&serde_json::to_value(tool)?))
            .collect()
    }

    async fn call_tool(&self, name: &str, args: Value) -> anyhow::Result<String> {
        let mut request = json!({ "name": name });
        if let Value::Object(arguments) = args {
            request["arguments"] = Value::Object(arguments);
        }
        let params: CallToolRequestParams = serde_json::from_value(request)?;

        let result = self.peer.call_tool(params).await?;
        let (text, is_error) = result_text(&serde_json::to_value(&result)?);
        if is_error {
            anyhow::bail!(text);
        }
        Ok(text)
    }

    async fn close(&self) {
        let Some(service) = self.service.lock().await.take() else {
            return;
        };
        match service.cancel().await {
            Ok(reason) => tracing::info!("Tool server {} closed: {:?}", self.label, reason),
            Err(e) => tracing::warn!("Tool server {} did not shut down cleanly: {}", self.label, e),
        }
    }
}

/// Read a descriptor from the wire form of an MCP `Tool`.
fn descriptor_from_json(tool: &Value) -> anyhow::Result<ToolDescriptor> {
    let name = tool
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("Tool without a name: {}", tool))?;
    Ok(ToolDescriptor {
        name: name.to_string(),
        description: tool
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        parameters: tool
            .get("inputSchema")
            .cloned()
            .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
    })
}

/// Text contents of a `CallToolResult`, newline-joined, plus its error flag.
fn result_text(result: &Value) -> (String, bool) {
    let text = result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    (text, is_error)
}
