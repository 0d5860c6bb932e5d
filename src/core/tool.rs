use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::core::error::GatewayError;
use crate::domain::uri::UriParams;

/// Minimal metadata every tool must expose.
pub trait ToolSpec {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON Schema the registry validates arguments against before `call`.
    fn input_schema(&self) -> JsonValue;
}

/// Tool = ToolSpec + handler. Arguments have already passed `input_schema`.
#[async_trait]
pub trait Tool: ToolSpec + Send + Sync {
    async fn call(&self, arguments: &JsonValue) -> Result<JsonValue, GatewayError>;
}

/// Metadata for a URI-addressed, read-only resource.
pub trait ResourceSpec {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Template with `<param>` placeholders, e.g. `schema://airport-<code>`.
    fn uri_template(&self) -> &'static str;
    fn mime_type(&self) -> &'static str {
        "application/json"
    }
}

#[async_trait]
pub trait Resource: ResourceSpec + Send + Sync {
    async fn read(&self, uri: &str, params: &UriParams) -> Result<JsonValue, GatewayError>;
}
