use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use nse_proxy::config::resolve_config;
use nse_proxy::lifecycle::{spawn_signal_listener, Shutdown};
use nse_proxy::observability::{logging, metrics};
use nse_proxy::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "nse-proxy", version, about = "NSE market-data proxy")]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "NSE_PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let resolved = resolve_config(cli.config.as_deref())?;

    logging::init_logging(&resolved.config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "nse-proxy starting");
    resolved.log_ignored();
    let config = resolved.config;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        environment = %config.observability.environment,
        upstream = %config.upstream.base_url,
        session_ttl_ms = config.session.ttl_ms,
        cache_ttl_ms = config.cache.ttl_ms,
        allowed_origins = ?config.cors.allowed_origins,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    HttpServer::new(config)?.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
