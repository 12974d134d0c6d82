//! MCP Gateway
//!
//! Serves the customer details gateway on `PORT` (default 3000).

use {
    anyhow::{Context, Result},
    gatewaymcp::{logging, GatewayConfig, GatewayServer},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init_tracing();

    let config = GatewayConfig::from_env().context("Invalid gateway configuration")?;
    logging::log_server_startup(config.port);

    let server = GatewayServer::new(config)?;
    server.start().await?;

    Ok(())
}
