use std::path::{Path, PathBuf};

use serde::Deserialize;

use common::ledger::LedgerConfig;
use common::storage::S3Config;

/// Gateway configuration, read once at startup from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// log at DEBUG rather than INFO unless overridden
    #[serde(default)]
    pub debug: bool,

    pub auth: AuthConfig,

    /// approval ledger backend, in-memory when omitted
    #[serde(default)]
    pub db: LedgerConfig,

    /// credentials and region for `s3://` locations
    #[serde(default)]
    pub s3: S3Config,

    /// directory servers for `http(s)://` locations
    #[serde(default)]
    pub generic: GenericConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub basic: BasicAuthConfig,
}

#[derive(Clone, Deserialize)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenericConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let basic = &self.auth.basic;
        if basic.username.is_empty() || basic.password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        if self.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("auth.basic.username and auth.basic.password must both be set")]
    MissingCredentials,
}
