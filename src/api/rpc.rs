use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value as J};

use crate::core::content;
use crate::core::error::GatewayError;
use crate::core::mcp::{InitializeResult, RpcReq, RpcResp};
use crate::infra::http::json as http_json;
use crate::tools::registry::Registry;

fn tools_list(reg: &Registry) -> J {
    let tools: Vec<J> = reg
        .list_tools()
        .into_iter()
        .map(|t| json!({ "name": t.name, "description": t.description, "inputSchema": t.input_schema }))
        .collect();
    json!({ "tools": tools })
}

fn templates_list(reg: &Registry) -> J {
    let templates: Vec<J> = reg
        .list_resources()
        .into_iter()
        .map(|r| {
            json!({
                "uriTemplate": r.uri_template,
                "name": r.name,
                "description": r.description,
                "mimeType": r.mime_type,
            })
        })
        .collect();
    json!({ "resourceTemplates": templates })
}

fn str_param<'a>(params: &'a J, key: &str) -> Result<&'a str, GatewayError> {
    params
        .get(key)
        .and_then(J::as_str)
        .ok_or_else(|| GatewayError::invalid_input(format!("missing `{key}` parameter")))
}

async fn call_tool(reg: &Registry, params: &J) -> Result<J, GatewayError> {
    let name = str_param(params, "name")?;
    let args = params.get("arguments").unwrap_or(&J::Null);
    let payload = reg.call_tool(name, args).await?;
    Ok(content::tool_result(&payload))
}

async fn read_resource(reg: &Registry, params: &J) -> Result<J, GatewayError> {
    let uri = str_param(params, "uri")?;
    let body = reg.read_resource(uri).await?;
    Ok(content::resource_result(&body.uri, body.mime_type, &body.payload))
}

fn respond(id: J, method: &str, outcome: Result<J, GatewayError>) -> RpcResp {
    match outcome {
        Ok(out) => http_json::ok(id, out).0,
        Err(e) => {
            if e.is_execution_failure() {
                tracing::warn!(method, kind = e.kind(), error = %e, "rpc call failed");
            } else {
                tracing::debug!(method, kind = e.kind(), error = %e, "rpc call rejected");
            }
            http_json::from_gateway_error(id, &e).0
        }
    }
}

/// JSON-RPC shim over the same registry the MCP transport serves.
pub async fn http(State(reg): State<Registry>, body: Bytes) -> Json<RpcResp> {
    let req: RpcReq = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable rpc request");
            return http_json::parse_error(format!("parse error: {e}"));
        }
    };
    tracing::debug!(method = %req.method, id = ?req.id, "rpc request");
    let id = req.id.clone();
    let resp = match req.method.as_str() {
        "initialize" => {
            let init = serde_json::to_value(InitializeResult::current()).unwrap_or(J::Null);
            http_json::ok(id, init).0
        }
        "shutdown" => http_json::ok(id, J::Null).0,
        "tools.list" | "tools/list" => http_json::ok(id, tools_list(&reg)).0,
        "tools.call" | "tools/call" => {
            respond(id, &req.method, call_tool(&reg, &req.params).await)
        }
        "resources.templates.list" | "resources/templates/list" => {
            http_json::ok(id, templates_list(&reg)).0
        }
        "resources.read" | "resources/read" => {
            respond(id, &req.method, read_resource(&reg, &req.params).await)
        }
        other => http_json::error(
            id,
            http_json::METHOD_NOT_FOUND,
            format!("unknown method: {other}"),
        )
        .0,
    };
    tracing::trace!(response = ?resp, "rpc response");
    Json(resp)
}
