#![forbid(unsafe_code)]
//! TallyChain node: serves the ledger API on the configured port

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tallychain::api::run_api_server;
use tallychain::config::{load_config, DEFAULT_CONFIG_PATH};
use tallychain::node::Node;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tally-node", about = "Run a TallyChain ledger node")]
struct Args {
    /// Port to listen on (overrides network.api_port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Peer to register at startup; may be repeated
    #[arg(long = "peer")]
    peers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = load_config(&args.config)?;
    if let Some(port) = args.port {
        config.network.api_port = port;
    }
    config.network.bootstrap_peers.extend(args.peers);

    let node = Arc::new(Node::new(config)?);
    info!(
        "Starting TallyChain node {} on port {}",
        node.node_id(),
        node.config.network.api_port
    );

    run_api_server(node).await
}
