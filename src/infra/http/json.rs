use axum::Json;
use serde_json::Value as JsonValue;

use crate::core::error::GatewayError;
use crate::core::mcp::{err as rpc_err, ok as rpc_ok, RpcResp};

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;

pub fn ok(id: JsonValue, result: JsonValue) -> Json<RpcResp> {
    Json(rpc_ok(id, result))
}

pub fn error(id: JsonValue, code: i32, message: impl Into<String>) -> Json<RpcResp> {
    Json(rpc_err(id, code, message, None))
}

pub fn parse_error(message: impl Into<String>) -> Json<RpcResp> {
    error(JsonValue::Null, PARSE_ERROR, message)
}

/// JSON-RPC error carrying the `{kind, message}` detail in `error.data`.
pub fn from_gateway_error(id: JsonValue, err: &GatewayError) -> Json<RpcResp> {
    Json(rpc_err(id, err.rpc_code(), err.to_string(), Some(err.detail())))
}
