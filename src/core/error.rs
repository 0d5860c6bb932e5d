use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::domain::uri::MalformedUri;

/// Missing or malformed provider credentials. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} contains whitespace or control characters")]
    Malformed(&'static str),
}

/// Failure talking to the flight-search provider.
///
/// `Transient` failures (timeouts, 5xx, throttling) are safe to retry
/// unchanged. `Permanent` failures need different input to succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("transient provider failure: {0}")]
    Transient(String),
    #[error("provider rejected request: {0}")]
    Permanent(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }
}

/// Gateway-wide error model for uniform JSON-RPC / MCP mapping.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("invalid input: {0}")]
    InputValidation(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("unknown tool: {0}")]
    ToolNotFound(String),
    #[error("no resource matches uri: {0}")]
    ResourceNotFound(String),
    #[error(transparent)]
    MalformedUri(#[from] MalformedUri),
}

impl GatewayError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        GatewayError::InputValidation(msg.into())
    }

    /// Stable machine-readable kind used in the error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Credential(_) => "credential_error",
            GatewayError::InputValidation(_) => "input_validation_error",
            GatewayError::Provider(ProviderError::Transient(_)) => "provider_error_transient",
            GatewayError::Provider(ProviderError::Permanent(_)) => "provider_error_permanent",
            GatewayError::ToolNotFound(_) => "tool_not_found",
            GatewayError::ResourceNotFound(_) => "resource_not_found",
            GatewayError::MalformedUri(_) => "malformed_uri",
        }
    }

    /// `{ "kind": ..., "message": ... }`
    pub fn detail(&self) -> JsonValue {
        json!({ "kind": self.kind(), "message": self.to_string() })
    }

    /// `{ "error": { "kind": ..., "message": ... } }`
    pub fn envelope(&self) -> JsonValue {
        json!({ "error": self.detail() })
    }

    /// JSON-RPC error code for the shim and the rmcp adapter.
    pub fn rpc_code(&self) -> i32 {
        match self {
            GatewayError::InputValidation(_)
            | GatewayError::ToolNotFound(_)
            | GatewayError::MalformedUri(_) => -32602,
            GatewayError::ResourceNotFound(_) => -32002,
            GatewayError::Credential(_) => -32603,
            GatewayError::Provider(_) => -32000,
        }
    }

    /// Failures that happened while executing a tool, as opposed to protocol
    /// misuse. MCP reports these inside the tool result.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, GatewayError::Provider(_) | GatewayError::Credential(_))
    }
}

impl From<GatewayError> for rmcp::ErrorData {
    fn from(e: GatewayError) -> Self {
        let data = Some(e.detail());
        let message = e.to_string();
        match e {
            GatewayError::ResourceNotFound(_) => rmcp::ErrorData::resource_not_found(message, data),
            GatewayError::InputValidation(_)
            | GatewayError::ToolNotFound(_)
            | GatewayError::MalformedUri(_) => rmcp::ErrorData::invalid_params(message, data),
            GatewayError::Credential(_) | GatewayError::Provider(_) => {
                rmcp::ErrorData::internal_error(message, data)
            }
        }
    }
}

/// Startup-time registration failures. These abort boot.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),
    #[error("resource `{0}` is already registered")]
    DuplicateResource(String),
    #[error("uri template `{0}` is already registered")]
    DuplicateTemplate(String),
    #[error("tool `{tool}` declares an invalid input schema: {message}")]
    InvalidSchema { tool: String, message: String },
    #[error("resource `{resource}` declares an invalid uri template: {source}")]
    InvalidTemplate {
        resource: String,
        #[source]
        source: MalformedUri,
    },
}
