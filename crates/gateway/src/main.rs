//! Egress gateway: releases files from object storage once enough reviewers
//! have approved them.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use service::process::{spawn_service, utils};
use service::Config;

/// Egress gateway - approval-gated file release
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "EGRESS_CONFIG", default_value = "/etc/egress/config.toml")]
    config: PathBuf,

    /// Port to listen on for HTTP requests
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Log level (error, warn, info, debug, trace), overrides `debug` in the config
    #[arg(long)]
    log_level: Option<tracing::Level>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    let log_level = args.log_level.unwrap_or_else(|| config.log_level());
    let _guard = utils::init_tracing(log_level);

    let listen_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port));
    spawn_service(&config, listen_addr, log_level).await;

    tracing::info!("egress gateway shutdown complete");
    Ok(())
}
