use axum::{
    routing::{any_service, get, post},
    Router,
};
use std::sync::Arc;

use crate::infra::mcp::make_factory;
use crate::infra::runtime::mcp_transport::{make_streamable_http_service, LocalSessionManager};
use crate::tools::registry::Registry;

/// `/healthz` + streamable MCP at `/mcp`, plus the JSON-RPC shim at
/// `/v1/rpc` unless `deprecate_rest` is set.
pub fn build_app(registry: Registry, deprecate_rest: bool) -> Router {
    let session_mgr = Arc::new(LocalSessionManager::default());
    let mcp_service = make_streamable_http_service(make_factory(registry.clone()), session_mgr);

    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route_service("/mcp", any_service(mcp_service));

    if deprecate_rest {
        return app;
    }
    let rpc = Router::new()
        .route("/v1/rpc", post(crate::api::rpc::http))
        .with_state(registry);
    app.merge(rpc)
}
