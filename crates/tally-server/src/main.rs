//! Tally Server - real-time classroom grading session.
//!
//! Serves the browser frontend, accepts one WebSocket per device, and
//! exports the aggregated results as CSV.

mod config;
mod web_server;
mod ws_channel;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tally_network::{interfaces, IdentityResolver, NeighborCacheResolver, SystemProbe};

use crate::config::ServerConfig;
use crate::web_server::WebServer;

/// Real-time classroom voting and grading server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind the HTTP listener to
    #[arg(long)]
    bind: Option<String>,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding the browser frontend
    #[arg(long)]
    web_root: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.http.bind_addr = bind;
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(web_root) = self.web_root {
            config.http.web_root = Some(web_root);
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    init_tracing(&config.logging.level);

    tracing::info!(
        session = %config.session.name,
        port = config.http.port,
        "Tally server starting"
    );

    let resolver: Arc<dyn IdentityResolver> = Arc::new(NeighborCacheResolver::new(
        SystemProbe::new(config.probe_timeout(), config.query_timeout()),
    ));

    let addresses = interfaces::list_display_addresses(config.http.port).await;
    for address in &addresses {
        tracing::info!(name = %address.name, url = %address.url, "Join address");
    }

    WebServer::new(&config, resolver, addresses).run().await
}
