use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use egress_local::process::spawn_server;
use egress_local::ServedRoot;
use service::process::utils;

/// Egress directory server - serves a local directory to the egress gateway
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory to serve
    #[arg(short, long, env = "EGRESS_LOCAL_ROOT")]
    root: PathBuf,

    /// Port to listen on for HTTP requests
    #[arg(short, long, env = "PORT", default_value = "8081")]
    port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = utils::init_tracing(args.log_level);

    let root = ServedRoot::open(&args.root)
        .with_context(|| format!("failed to open {}", args.root.display()))?;
    tracing::info!(root = %args.root.display(), "serving directory");

    let listen_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port));
    spawn_server(root, listen_addr, args.log_level).await;

    tracing::info!("directory server shutdown complete");
    Ok(())
}
