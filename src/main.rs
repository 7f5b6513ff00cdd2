//! # reposync Main Entry Point
//!
//! Loads configuration, prepares the database and runs the enabled
//! front-ends until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use reposync::{
    config::{ConfigLoader, ServerMode},
    db,
    rpc::server::run_rpc_server,
    server::run_http_server,
    service::{CatalogService, RepositoryService},
    telemetry,
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "reposync", version, about = "GitHub repository and commit sync service")]
struct Cli {
    /// Directory holding the layered `.env` files
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Front-ends to run; overrides the enable flags from configuration
    #[arg(long, value_enum)]
    server: Option<ServerMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loader = match cli.config_dir {
        Some(dir) => ConfigLoader::with_base_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = loader
        .load_with_mode(cli.server)
        .context("failed to load configuration")?;

    telemetry::init_tracing(&config).context("failed to initialize tracing")?;
    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted) = config.redacted_json() {
        tracing::debug!(config = %redacted, "Effective configuration");
    }
    if config.github.effective_token().is_none() {
        tracing::warn!("No GitHub token configured; requests are unauthenticated");
    }

    let db = Arc::new(db::init_pool(&config).await?);
    let service: Arc<dyn RepositoryService> =
        Arc::new(CatalogService::from_config(&config, db).context("failed to build GitHub client")?);

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
            }
            shutdown.cancel();
        });
    }

    let mut servers = JoinSet::new();
    if config.server.http_enable {
        let config = config.clone();
        let service = service.clone();
        let shutdown = shutdown.clone();
        servers.spawn(async move {
            run_http_server(&config, service, shutdown)
                .await
                .context("HTTP server failed")
        });
    }
    if config.server.rpc_enable {
        let socket_path = config.server.rpc_address.clone();
        let service = service.clone();
        let shutdown = shutdown.clone();
        servers.spawn(async move {
            run_rpc_server(&socket_path, service, shutdown)
                .await
                .context("RPC server failed")
        });
    }

    // One front-end failing stops the others.
    let mut outcome = Ok(());
    while let Some(joined) = servers.join_next().await {
        let result = joined.context("server task panicked").and_then(|r| r);
        if let Err(e) = result {
            tracing::error!(error = %e, "Front-end stopped");
            shutdown.cancel();
            if outcome.is_ok() {
                outcome = Err(e);
            }
        }
    }

    tracing::info!("reposync stopped");
    outcome
}
