//! Uniform tool-result envelope shared by the JSON-RPC shim.

use serde_json::{json, Value as JsonValue};

/// `{ "content": [{ "type": "text", "text": <json> }], "structuredContent": <json> }`
///
/// Same shape MCP clients get from `tools/call`, so callers of either
/// transport read results the same way.
pub fn tool_result(payload: &JsonValue) -> JsonValue {
    json!({
        "content": [{ "type": "text", "text": payload.to_string() }],
        "structuredContent": payload,
    })
}

/// `{ "contents": [{ "uri", "mimeType", "text" }] }` for resource reads.
pub fn resource_result(uri: &str, mime_type: &str, payload: &JsonValue) -> JsonValue {
    json!({
        "contents": [{ "uri": uri, "mimeType": mime_type, "text": payload.to_string() }]
    })
}
