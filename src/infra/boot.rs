use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use crate::clients::amadeus::AmadeusClient;
use crate::infra::config::{Config, Mode};
use crate::infra::mcp::GatewaySvc;
use crate::tools::build_registry;

/// Build the provider client and registry from `cfg`, then serve MCP over
/// stdio or HTTP. Nothing is bound until the registry is complete.
pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        deprecate_rest = cfg.deprecate_rest,
        provider = %cfg.provider.base_url,
        client_id = cfg.credentials.client_id(),
        "BOOT flight-mcp-gateway"
    );

    let client = AmadeusClient::new(&cfg.provider, cfg.credentials)
        .context("building provider client")?;
    let registry = build_registry(Arc::new(client)).context("registering tools")?;

    if cfg.mode == Mode::Stdio {
        crate::infra::runtime::mcp_transport::serve_stdio(GatewaySvc::new(registry))
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = crate::infra::http_app::build_app(registry, cfg.deprecate_rest);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
