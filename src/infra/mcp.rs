//! MCP server integration for flight-mcp-gateway.
//!
//! `GatewaySvc` implements rmcp's `ServerHandler` directly on top of the
//! explicit `Registry`, so tools and resources are listed and dispatched from
//! the same table the JSON-RPC shim uses:
//! - `tools/list` / `tools/call`
//! - `resources/templates/list` / `resources/read`
//!
//! Tool payloads go to `structuredContent`. Provider failures come back as a
//! tool result with `isError: true` and `{"error": {"kind", "message"}}`;
//! protocol misuse (unknown tool, bad arguments, bad URI) is a JSON-RPC error.

use std::future::Future;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, JsonObject, ListResourceTemplatesResult, ListToolsResult,
    PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult, ResourceContents,
    ResourceTemplate, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::Value as JsonValue;

use crate::tools::registry::Registry;

const INSTRUCTIONS: &str = "Flight search gateway. Call search_flight_offers with IATA airport codes and YYYY-MM-DD dates; \
codes in the offers are explained by the returned dictionary. Read schema://airport-{code} for airport details.";

/// The MCP server handler. Cheap to clone; every session shares one registry.
#[derive(Clone)]
pub struct GatewaySvc {
    registry: Registry,
}

impl GatewaySvc {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn mcp_tools(&self) -> Vec<McpTool> {
        self.registry
            .list_tools()
            .into_iter()
            .map(|meta| {
                let schema: JsonObject = match meta.input_schema {
                    JsonValue::Object(map) => map,
                    _ => JsonObject::new(),
                };
                McpTool::new(meta.name, meta.description, Arc::new(schema))
            })
            .collect()
    }

    pub fn mcp_resource_templates(&self) -> Result<Vec<ResourceTemplate>, McpError> {
        self.registry
            .list_resources()
            .into_iter()
            .map(|meta| {
                serde_json::from_value(serde_json::json!({
                    "uriTemplate": meta.uri_template,
                    "name": meta.name,
                    "description": meta.description,
                    "mimeType": meta.mime_type,
                }))
                .map_err(|e| McpError::internal_error(e.to_string(), None))
            })
            .collect()
    }

    pub async fn dispatch_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = name, "mcp tools/call");
        let args = JsonValue::Object(arguments.unwrap_or_default());
        match self.registry.call_tool(name, &args).await {
            Ok(payload) => Ok(CallToolResult::structured(payload)),
            Err(e) if e.is_execution_failure() => {
                tracing::warn!(tool = name, kind = e.kind(), error = %e, "tool execution failed");
                Ok(CallToolResult::structured_error(e.envelope()))
            }
            Err(e) => {
                tracing::debug!(tool = name, kind = e.kind(), error = %e, "tool call rejected");
                Err(e.into())
            }
        }
    }

    pub async fn dispatch_read(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        tracing::debug!(uri, "mcp resources/read");
        let body = self.registry.read_resource(uri).await.map_err(|e| {
            tracing::debug!(uri, kind = e.kind(), error = %e, "resource read failed");
            McpError::from(e)
        })?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(body.payload.to_string(), body.uri)],
        })
    }
}

impl ServerHandler for GatewaySvc {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.mcp_tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { self.dispatch_tool(&request.name, request.arguments).await }
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_ {
        std::future::ready(
            self.mcp_resource_templates()
                .map(ListResourceTemplatesResult::with_all_items),
        )
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move { self.dispatch_read(&request.uri).await }
    }
}

/// Factory required by the rmcp transports: one handler per session, all
/// sharing the same registry.
pub fn make_factory(registry: Registry) -> impl Fn() -> GatewaySvc + Clone + Send + Sync + 'static {
    move || GatewaySvc::new(registry.clone())
}
