use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use arena_server::{NoopPublisher, ServerConfig};
use arena_telemetry::{init_telemetry, TelemetryConfig};

/// Matchmaking, card battles, and chat over WebSockets.
#[derive(Debug, Parser)]
#[command(name = "arena", version)]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Directory of static front-end assets to serve at `/`.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let telemetry = init_telemetry(TelemetryConfig {
        json_output: cli.json_logs,
        ..Default::default()
    });

    tracing::info!("starting arena server");

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        static_dir: cli.static_dir,
        ..Default::default()
    };

    let handle = arena_server::start(config, Arc::new(NoopPublisher), telemetry.metrics()).await?;
    tracing::info!(port = handle.port, "arena server ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
