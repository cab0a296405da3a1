//! Tool connections used by the agent.
//!
//! A [`ToolConnection`] is opened once per chat session and reused for every
//! turn. It is either an MCP client talking to the `cocktail-mcp` subprocess
//! or an in-process wrapper around [`CocktailToolbox`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cocktail::{CocktailDbClient, CocktailToolbox};
use crate::config::{ToolServerConfig, ToolTransport};
use crate::llm::ToolDefinition;
use crate::mcp::McpToolConnection;

/// Name, description and JSON schema of a callable tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDescriptor {
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::function(&self.name, &self.description, self.parameters.clone())
    }
}

#[async_trait]
pub trait ToolConnection: Send + Sync {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>>;

    /// Run a tool and return its text output. Tool-reported failures are `Err`.
    async fn call_tool(&self, name: &str, args: Value) -> anyhow::Result<String>;

    /// Release the connection. Safe to call more than once.
    async fn close(&self);
}

pub type SharedToolConnection = Arc<dyn ToolConnection>;

/// Tools served from this process, without a subprocess.
pub struct LocalToolConnection {
    toolbox: CocktailToolbox,
}

impl LocalToolConnection {
    pub fn new(toolbox: CocktailToolbox) -> Self {
        Self { toolbox }
    }
}

#[async_trait]
impl ToolConnection for LocalToolConnection {
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
        Ok(CocktailToolbox::specs()
            .into_iter()
            .map(|spec| ToolDescriptor {
                name: spec.name.to_string(),
                description: spec.description.to_string(),
                parameters: spec.parameters,
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, args: Value) -> anyhow::Result<String> {
        self.toolbox.call(name, args).await
    }

    async fn close(&self) {}
}

/// Something that can open a tool connection for a new session.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn connect(&self) -> anyhow::Result<SharedToolConnection>;
}

/// Opens tool connections according to configuration.
#[derive(Debug, Clone)]
pub struct ToolConnector {
    config: ToolServerConfig,
    cocktail_api_base_url: String,
}

impl ToolConnector {
    pub fn new(config: ToolServerConfig, cocktail_api_base_url: impl Into<String>) -> Self {
        Self {
            config,
            cocktail_api_base_url: cocktail_api_base_url.into(),
        }
    }
}

#[async_trait]
impl ToolSource for ToolConnector {
    async fn connect(&self) -> anyhow::Result<SharedToolConnection> {
        tracing::debug!(transport = %self.config.transport, "Opening tool connection");
        match self.config.transport {
            ToolTransport::InProcess => {
                let client = CocktailDbClient::new(&self.cocktail_api_base_url)?;
                Ok(Arc::new(LocalToolConnection::new(CocktailToolbox::new(client))))
            }
            ToolTransport::Stdio => {
                let command = match &self.config.command {
                    Some(command) => command.clone(),
                    None => default_server_command()?,
                };
                let env = [("COCKTAIL_API_BASE_URL", self.cocktail_api_base_url.as_str())];
                let connection = McpToolConnection::spawn(&command, &self.config.args, &env).await?;
                Ok(Arc::new(connection))
            }
        }
    }
}

/// The `cocktail-mcp` binary installed next to the running executable.
fn default_server_command() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let name = format!("cocktail-mcp{}", std::env::consts::EXE_SUFFIX);
    Ok(exe.with_file_name(name))
}
