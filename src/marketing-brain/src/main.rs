//! Marketing Brain — campaign performance analysis service.
//!
//! Main entry point that loads configuration and starts the server.

use brain_api::ApiServer;
use brain_core::config::AppConfig;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "marketing-brain")]
#[command(about = "Campaign performance analysis service")]
#[command(version)]
struct Cli {
    /// Listen host (overrides config)
    #[arg(long, env = "MARKETING_BRAIN__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "MARKETING_BRAIN__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "MARKETING_BRAIN__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Directory for archived analysis results (overrides config)
    #[arg(long, env = "MARKETING_BRAIN__ARCHIVE__DIR")]
    archive_dir: Option<String>,

    /// Skip archiving analysis results to disk
    #[arg(long, default_value_t = false)]
    no_archive: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketing_brain=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Marketing Brain starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(dir) = cli.archive_dir {
        config.archive.dir = dir;
    }
    if cli.no_archive {
        config.archive.enabled = false;
    }

    info!(
        host = %config.api.host,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        archive_enabled = config.archive.enabled,
        archive_dir = %config.archive.dir,
        "Configuration loaded"
    );

    let api_server = ApiServer::new(config);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Marketing Brain is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
