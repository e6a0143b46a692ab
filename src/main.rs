//! gh-relay: edge reverse proxy for GitHub release, archive, raw-file,
//! gist and git smart-HTTP endpoints.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use gh_relay::config::{load_config, ProxyConfig};
use gh_relay::lifecycle::signals;
use gh_relay::net::tls::load_tls_config;
use gh_relay::observability::{logging, metrics};
use gh_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "gh-relay")]
#[command(about = "Edge relay for GitHub downloads and git over HTTP", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("gh-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        prefix = %config.relay.prefix,
        asset_url = %config.relay.asset_url,
        jsdelivr = config.mirror.jsdelivr,
        allow_list = config.relay.allow_list.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::forward_to(&signal_shutdown).await;
    });

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address.parse()?;
            let rustls = load_tls_config(&tls).await?;
            server.run_tls(addr, rustls, server_shutdown).await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(&bind_address).await?;
            server.run(listener, server_shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
