//! # Blockclock
//!
//! Follows a Bitcoin node and streams the last blocks and every new
//! mempool transaction to connected browser clocks.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments and load configuration (file, environment, flags)
//! 2. Initialize logging
//! 3. Connect the configured feed
//! 4. Restore or backfill the chain cache
//! 5. Bind the HTTP port and run until Ctrl-C or a fatal error

use anyhow::{Context, Result};
use bc_03_feed::connect_feed;
use bc_04_broadcast::bind;
use bc_telemetry::init_telemetry;
use clap::Parser;
use node_runtime::{shutdown_on_ctrl_c, BlockclockRuntime, Cli};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("loading configuration")?;
    init_telemetry(&config.telemetry).context("initializing logging")?;

    info!("===========================================");
    info!("  Blockclock v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    if let Err(e) = run(config).await {
        error!(error = %format!("{e:#}"), "Blockclock stopped");
        return Err(e);
    }
    Ok(())
}

async fn run(config: node_runtime::NodeConfig) -> Result<()> {
    let feed = connect_feed(&config.feed, config.network())
        .await
        .context("connecting to the node")?;
    let listener = bind(&config.server)
        .await
        .with_context(|| format!("binding {}:{}", config.server.host, config.server.port))?;

    let runtime = BlockclockRuntime::initialize(config, feed).await?;
    shutdown_on_ctrl_c(runtime.shutdown_handle());
    runtime.run(listener).await
}
