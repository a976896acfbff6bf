pub mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;

use crate::http;
use crate::{Config, ServiceState};

pub const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Run the gateway until SIGINT or SIGTERM. Logging must already be set up.
pub async fn spawn_service(config: &Config, listen_addr: SocketAddr, log_level: tracing::Level) {
    utils::register_panic_logger();
    utils::report_build_info("egress");

    let (graceful_waiter, shutdown_rx) = match utils::graceful_shutdown_blocker() {
        Ok(blocker) => blocker,
        Err(e) => {
            tracing::error!("failed to install signal handlers: {}", e);
            std::process::exit(2);
        }
    };

    let state = match ServiceState::from_config(config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("error creating server state: {}", e);
            std::process::exit(3);
        }
    };

    let mut handles = Vec::new();

    let api_config = http::Config::new(listen_addr, log_level);
    let api_rx = shutdown_rx.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = http::run_api(api_config, state, api_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });
    handles.push(api_handle);

    let _ = graceful_waiter.await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
        .await
        .is_err()
    {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}
