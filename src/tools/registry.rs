use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::core::error::{GatewayError, RegistryError};
use crate::core::tool::{Resource, Tool};
use crate::domain::uri::{MalformedUri, UriTemplate};

struct ToolEntry {
    tool: Arc<dyn Tool>,
    validator: jsonschema::Validator,
}

struct ResourceEntry {
    resource: Arc<dyn Resource>,
    template: UriTemplate,
}

struct Tables {
    tools: BTreeMap<&'static str, ToolEntry>,
    resources: Vec<ResourceEntry>,
}

/// Startup-time registration. Duplicates and invalid contracts fail fast.
pub struct RegistryBuilder {
    tables: Tables,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            tables: Tables {
                tools: BTreeMap::new(),
                resources: Vec::new(),
            },
        }
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self, RegistryError> {
        let name = tool.name();
        if self.tables.tools.contains_key(name) {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }
        let schema = tool.input_schema();
        let validator =
            jsonschema::validator_for(&schema).map_err(|e| RegistryError::InvalidSchema {
                tool: name.to_string(),
                message: e.to_string(),
            })?;
        tracing::debug!(tool = name, "registered tool");
        self.tables.tools.insert(name, ToolEntry { tool, validator });
        Ok(self)
    }

    pub fn register_resource(&mut self, resource: Arc<dyn Resource>) -> Result<&mut Self, RegistryError> {
        let name = resource.name();
        let template = UriTemplate::parse(resource.uri_template()).map_err(|source| {
            RegistryError::InvalidTemplate {
                resource: name.to_string(),
                source,
            }
        })?;
        for existing in &self.tables.resources {
            if existing.resource.name() == name {
                return Err(RegistryError::DuplicateResource(name.to_string()));
            }
            if existing.template == template {
                return Err(RegistryError::DuplicateTemplate(template.as_str().to_string()));
            }
        }
        tracing::debug!(resource = name, template = template.as_str(), "registered resource");
        self.tables.resources.push(ResourceEntry { resource, template });
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            tables: Arc::new(self.tables),
        }
    }
}

/// Immutable tool/resource table, cheap to clone into each transport.
#[derive(Clone)]
pub struct Registry {
    tables: Arc<Tables>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub uri_template: String,
    pub mime_type: &'static str,
}

/// A successful resource read.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBody {
    pub uri: String,
    pub mime_type: &'static str,
    pub payload: JsonValue,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn list_tools(&self) -> Vec<ToolMeta> {
        self.tables
            .tools
            .values()
            .map(|e| ToolMeta {
                name: e.tool.name(),
                description: e.tool.description(),
                input_schema: e.tool.input_schema(),
            })
            .collect()
    }

    pub fn list_resources(&self) -> Vec<ResourceMeta> {
        self.tables
            .resources
            .iter()
            .map(|e| ResourceMeta {
                name: e.resource.name(),
                description: e.resource.description(),
                uri_template: e.template.to_rfc6570(),
                mime_type: e.resource.mime_type(),
            })
            .collect()
    }

    /// Validate `args` against the tool's schema, then run it. The handler is
    /// never invoked with arguments that violate the schema.
    pub async fn call_tool(&self, name: &str, args: &JsonValue) -> Result<JsonValue, GatewayError> {
        let entry = self
            .tables
            .tools
            .get(name)
            .ok_or_else(|| GatewayError::ToolNotFound(name.to_string()))?;

        let empty = JsonValue::Object(Default::default());
        let args = if args.is_null() { &empty } else { args };
        let violations: Vec<String> = entry
            .validator
            .iter_errors(args)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();
        if !violations.is_empty() {
            tracing::debug!(tool = name, ?violations, "rejected tool arguments");
            return Err(GatewayError::InputValidation(violations.join("; ")));
        }

        tracing::debug!(tool = name, "dispatching tool call");
        entry.tool.call(args).await
    }

    /// Route `uri` to the first resource whose template matches.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceBody, GatewayError> {
        let mut malformed: Option<MalformedUri> = None;
        for entry in &self.tables.resources {
            match entry.template.resolve(uri) {
                Ok(params) => {
                    tracing::debug!(resource = entry.resource.name(), uri, "dispatching resource read");
                    let payload = entry.resource.read(uri, &params).await?;
                    return Ok(ResourceBody {
                        uri: uri.to_string(),
                        mime_type: entry.resource.mime_type(),
                        payload,
                    });
                }
                Err(MalformedUri::PrefixMismatch { .. }) => {}
                Err(e) => {
                    malformed.get_or_insert(e);
                }
            }
        }
        Err(match malformed {
            Some(e) => e.into(),
            None => GatewayError::ResourceNotFound(uri.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tool::{ResourceSpec, ToolSpec};
    use crate::domain::uri::UriParams;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
    }

    impl ToolSpec for Echo {
        fn name(&self) -> &'static str {
            "test.echo"
        }
        fn description(&self) -> &'static str {
            "echo tool"
        }
        fn input_schema(&self) -> JsonValue {
            json!({
                "type": "object",
                "properties": { "n": { "type": "integer", "minimum": 1 } },
                "required": ["n"]
            })
        }
    }

    #[async_trait]
    impl Tool for Echo {
        async fn call(&self, args: &JsonValue) -> Result<JsonValue, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(args.clone())
        }
    }

    struct BadSchema;

    impl ToolSpec for BadSchema {
        fn name(&self) -> &'static str {
            "test.bad"
        }
        fn description(&self) -> &'static str {
            "broken"
        }
        fn input_schema(&self) -> JsonValue {
            json!({ "type": 12 })
        }
    }

    #[async_trait]
    impl Tool for BadSchema {
        async fn call(&self, _args: &JsonValue) -> Result<JsonValue, GatewayError> {
            Ok(JsonValue::Null)
        }
    }

    struct Item(&'static str, &'static str);

    impl ResourceSpec for Item {
        fn name(&self) -> &'static str {
            self.0
        }
        fn description(&self) -> &'static str {
            "item"
        }
        fn uri_template(&self) -> &'static str {
            self.1
        }
    }

    #[async_trait]
    impl Resource for Item {
        async fn read(&self, _uri: &str, params: &UriParams) -> Result<JsonValue, GatewayError> {
            Ok(json!({ "code": params.get("code") }))
        }
    }

    fn registry(echo: Arc<Echo>) -> Registry {
        let mut b = Registry::builder();
        b.register_tool(echo).unwrap();
        b.register_resource(Arc::new(Item("airport", "schema://airport-<code>")))
            .unwrap();
        b.build()
    }

    #[tokio::test]
    async fn registry_registers_lists_and_calls() {
        let echo = Arc::new(Echo::default());
        let reg = registry(echo.clone());
        let metas = reg.list_tools();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].name, "test.echo");
        let out = reg.call_tool("test.echo", &json!({"n": 2})).await.unwrap();
        assert_eq!(out["n"], 2);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_tool_is_typed_not_found() {
        let reg = registry(Arc::new(Echo::default()));
        let err = reg.call_tool("does.not.exist", &json!({})).await.unwrap_err();
        assert!(matches!(err, GatewayError::ToolNotFound(ref n) if n == "does.not.exist"));
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_handler() {
        let echo = Arc::new(Echo::default());
        let reg = registry(echo.clone());
        for bad in [json!({}), json!({"n": 0}), json!({"n": "two"}), JsonValue::Null] {
            let err = reg.call_tool("test.echo", &bad).await.unwrap_err();
            assert!(matches!(err, GatewayError::InputValidation(_)), "{bad} should be rejected");
        }
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_tool_fails_fast() {
        let mut b = Registry::builder();
        b.register_tool(Arc::new(Echo::default())).unwrap();
        let err = b.register_tool(Arc::new(Echo::default())).err().unwrap();
        assert!(matches!(err, RegistryError::DuplicateTool(ref n) if n == "test.echo"));
    }

    #[test]
    fn duplicate_resource_name_or_template_fails_fast() {
        let mut b = Registry::builder();
        b.register_resource(Arc::new(Item("airport", "schema://airport-<code>")))
            .unwrap();
        let err = b
            .register_resource(Arc::new(Item("airport", "schema://city-<code>")))
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::DuplicateResource(_)));
        let err = b
            .register_resource(Arc::new(Item("airport2", "schema://airport-<code>")))
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::DuplicateTemplate(_)));
    }

    #[test]
    fn invalid_contracts_fail_at_registration() {
        let mut b = Registry::builder();
        assert!(matches!(
            b.register_tool(Arc::new(BadSchema)).err().unwrap(),
            RegistryError::InvalidSchema { .. }
        ));
        assert!(matches!(
            b.register_resource(Arc::new(Item("x", "<code>"))).err().unwrap(),
            RegistryError::InvalidTemplate { .. }
        ));
    }

    #[tokio::test]
    async fn reads_resource_by_template() {
        let reg = registry(Arc::new(Echo::default()));
        let body = reg.read_resource("schema://airport-BOS").await.unwrap();
        assert_eq!(body.payload["code"], "BOS");
        assert_eq!(body.mime_type, "application/json");
        let metas = reg.list_resources();
        assert_eq!(metas[0].uri_template, "schema://airport-{code}");
    }

    #[tokio::test]
    async fn resource_errors_distinguish_unknown_from_malformed() {
        let reg = registry(Arc::new(Echo::default()));
        let err = reg.read_resource("http://other").await.unwrap_err();
        assert!(matches!(err, GatewayError::ResourceNotFound(_)));
        let err = reg.read_resource("schema://airport-").await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedUri(MalformedUri::EmptySegment { .. })));
    }
}
