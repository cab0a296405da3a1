//! Configuration management for the cocktail chat server.
//!
//! Configuration is read from environment variables (a `.env` file is loaded
//! first by the binaries):
//! - `GEMINI_API_KEY` - Required (falls back to `GOOGLE_API_KEY`). LLM API key.
//! - `GEMINI_MODEL` - Optional. Model identifier. Defaults to `gemini-2.5-pro-preview-03-25`.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible endpoint. Defaults to Gemini's.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `STATIC_DIR` - Optional. Directory holding `index.html`. Defaults to `static`.
//! - `MAX_ITERATIONS` - Optional. Tool rounds per turn. Defaults to `10`.
//! - `TURN_TIMEOUT_SECS` - Optional. Per-turn timeout. Defaults to `300`.
//! - `AGENT_INSTRUCTION` - Optional. System instruction for the agent.
//! - `TOOL_TRANSPORT` - Optional. `stdio` (default) or `inprocess`.
//! - `TOOL_SERVER_COMMAND` - Optional. Tool server executable. Defaults to the
//!   `cocktail-mcp` binary next to the running executable.
//! - `TOOL_SERVER_ARGS` - Optional. Whitespace-separated tool server arguments.
//! - `COCKTAIL_API_BASE_URL` - Optional. TheCocktailDB API base.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cocktail::DEFAULT_API_BASE_URL;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro-preview-03-25";
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_INSTRUCTION: &str = "You're a helpful assistant. Use tools to get information \
to answer user questions. Always respond in Traditional Chinese (繁體中文). Please format your \
answer in markdown format.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// How the agent reaches its tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTransport {
    /// MCP over the stdio of a spawned tool server
    Stdio,
    /// Tools called directly, no subprocess
    InProcess,
}

impl FromStr for ToolTransport {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "stdio" | "mcp" => Ok(Self::Stdio),
            "inprocess" | "in-process" | "local" => Ok(Self::InProcess),
            other => Err(format!("expected `stdio` or `inprocess`, got: {}", other)),
        }
    }
}

impl fmt::Display for ToolTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => f.write_str("stdio"),
            Self::InProcess => f.write_str("inprocess"),
        }
    }
}

/// Tool server configuration.
#[derive(Debug, Clone)]
pub struct ToolServerConfig {
    pub transport: ToolTransport,

    /// Executable to spawn; `None` means the sibling `cocktail-mcp`
    pub command: Option<PathBuf>,

    pub args: Vec<String>,
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            transport: ToolTransport::Stdio,
            command: None,
            args: Vec::new(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM API key
    pub api_key: String,

    /// Model identifier sent with every completion request
    pub default_model: String,

    /// Base URL of the OpenAI-compatible chat-completions API
    pub llm_base_url: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Directory served at `/` and `/static`
    pub static_dir: PathBuf,

    /// Maximum LLM round trips per turn
    pub max_iterations: usize,

    pub turn_timeout: Duration,

    /// System instruction for the agent
    pub instruction: String,

    pub tools: ToolServerConfig,

    pub cocktail_api_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if neither `GEMINI_API_KEY` nor
    /// `GOOGLE_API_KEY` is set, and `ConfigError::InvalidValue` for values
    /// that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = non_empty_var("GEMINI_API_KEY")
            .or_else(|| non_empty_var("GOOGLE_API_KEY"))
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let default_model =
            non_empty_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let llm_base_url =
            non_empty_var("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = parse_var("PORT", 8000u16)?;

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static"));

        let max_iterations = parse_var("MAX_ITERATIONS", 10usize)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let turn_timeout = Duration::from_secs(parse_var("TURN_TIMEOUT_SECS", 300u64)?);

        let instruction =
            non_empty_var("AGENT_INSTRUCTION").unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string());

        let tools = ToolServerConfig {
            transport: parse_var("TOOL_TRANSPORT", ToolTransport::Stdio)?,
            command: non_empty_var("TOOL_SERVER_COMMAND").map(PathBuf::from),
            args: std::env::var("TOOL_SERVER_ARGS")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        };

        let cocktail_api_base_url = non_empty_var("COCKTAIL_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        Ok(Self {
            api_key,
            default_model,
            llm_base_url,
            host,
            port,
            static_dir,
            max_iterations,
            turn_timeout,
            instruction,
            tools,
            cocktail_api_base_url,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String, static_dir: PathBuf) -> Self {
        Self {
            api_key,
            default_model,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            static_dir,
            max_iterations: 10,
            turn_timeout: Duration::from_secs(300),
            instruction: DEFAULT_INSTRUCTION.to_string(),
            tools: ToolServerConfig::default(),
            cocktail_api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match non_empty_var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}
