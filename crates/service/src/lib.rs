//! Service layer of the egress gateway.
//!
//! This crate provides the components behind the `egress` binary:
//! - Configuration (TOML file with auth, ledger and storage settings)
//! - The download gate, deciding whether an approved file may leave
//! - HTTP handlers (probes, the `/v0` file API, basic auth)
//! - Process lifecycle (logging, signals, graceful shutdown)

pub mod config;
pub mod gate;
pub mod http;
pub mod process;
pub mod state;

pub use config::{Config, ConfigError};
pub use gate::{Gate, GateError};
pub use state::{State as ServiceState, StateSetupError};
