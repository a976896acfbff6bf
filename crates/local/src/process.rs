use std::net::SocketAddr;

use tokio::time::timeout;

use service::http::Config;
use service::process::{utils, FINAL_SHUTDOWN_TIMEOUT};

use crate::http;
use crate::root::ServedRoot;

/// Serve `root` until SIGINT or SIGTERM. Logging must already be set up.
pub async fn spawn_server(root: ServedRoot, listen_addr: SocketAddr, log_level: tracing::Level) {
    utils::register_panic_logger();
    utils::report_build_info("egress-local");

    let (graceful_waiter, shutdown_rx) = match utils::graceful_shutdown_blocker() {
        Ok(blocker) => blocker,
        Err(e) => {
            tracing::error!("failed to install signal handlers: {}", e);
            std::process::exit(2);
        }
    };

    let config = Config::new(listen_addr, log_level);
    let server = tokio::spawn(async move {
        if let Err(e) = http::run(config, root, shutdown_rx).await {
            tracing::error!("directory server error: {}", e);
        }
    });

    let _ = graceful_waiter.await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, server).await.is_err() {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}
