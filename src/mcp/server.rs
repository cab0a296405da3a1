//! MCP server exposing the cocktail tools.

use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    },
    service::{RequestContext, RoleServer},
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde_json::Value;
use tokio::io::{stdin, stdout};

use crate::cocktail::CocktailToolbox;

#[derive(Clone)]
pub struct CocktailMcpServer {
    toolbox: CocktailToolbox,
}

impl CocktailMcpServer {
    pub fn new(toolbox: CocktailToolbox) -> Self {
        Self { toolbox }
    }

    /// Serve MCP over stdin/stdout until the client goes away.
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("Starting cocktail MCP server...");
        let server = self.serve((stdin(), stdout())).await?;
        tracing::info!("MCP server initialized, waiting for requests...");
        let reason = server.waiting().await?;
        tracing::info!("MCP server stopped: {:?}", reason);
        Ok(())
    }

    fn tools() -> Vec<Tool> {
        CocktailToolbox::specs()
            .into_iter()
            .map(|spec| {
                let schema = match spec.parameters {
                    Value::Object(map) => map,
                    _ => serde_json::Map::new(),
                };
                Tool::new(spec.name, spec.description, schema)
            })
            .collect()
    }
}

impl ServerHandler for CocktailMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "cocktail".to_string(),
                title: Some("Cocktail recipes".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Cocktail recipes from TheCocktailDB. Use search_cocktail_by_name or \
                list_cocktails_by_first_letter to find drinks, lookup_cocktail_details_by_id \
                for a full recipe, search_ingredient_by_name for ingredient facts and \
                list_random_cocktails for inspiration."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            meta: None,
            tools: Self::tools(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let name = request.name.as_ref();
        if !CocktailToolbox::specs().iter().any(|spec| spec.name == name) {
            return Err(McpError::invalid_params(
                format!("Unknown tool: {}", name),
                None,
            ));
        }

        let args = Value::Object(request.arguments.unwrap_or_default());
        tracing::debug!(tool = name, %args, "Tool call");
        match self.toolbox.call(name, args).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(error) => {
                tracing::warn!(tool = name, "Tool call failed: {}", error);
                Ok(CallToolResult::error(vec![Content::text(error.to_string())]))
            }
        }
    }
}
