//! krar CLI entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use krar_cli::args::Cli;
use krar_cli::report;
use krar_core::Result;
use krar_runtime::{KubeCluster, OciRegistryInspector};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;

    let cluster = Arc::new(KubeCluster::connect().await?);
    let registry = Arc::new(OciRegistryInspector::new(config.registry_auth.clone()));

    let summary = tokio::select! {
        result = krar_runtime::run(&config, cluster, registry) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; aborting run");
            return Ok(());
        }
    };

    report::print_summary(&config, &summary);
    Ok(())
}
