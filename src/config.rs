//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub const ENV_BIND_ADDR: &str = "CATALOG_BIND_ADDR";
pub const ENV_DATA_DIR: &str = "CATALOG_DATA_DIR";
pub const ENV_MAILBOX_SIZE: &str = "CATALOG_MAILBOX_SIZE";
pub const ENV_SUBSCRIBER_BUFFER: &str = "CATALOG_SUBSCRIBER_BUFFER";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Configuration for the catalog service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Directory holding the `products` and `carts` snapshots.
    pub data_dir: PathBuf,
    /// Capacity of each store actor's mailbox.
    pub mailbox_size: usize,
    /// Snapshots buffered per live subscriber before broadcasts are dropped.
    pub subscriber_buffer: usize,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr,
            data_dir: data_dir.into(),
            mailbox_size: 32,
            subscriber_buffer: 64,
        }
    }

    pub fn with_mailbox_size(mut self, size: usize) -> Self {
        self.mailbox_size = size;
        self
    }

    pub fn with_subscriber_buffer(mut self, size: usize) -> Self {
        self.subscriber_buffer = size;
        self
    }

    /// Reads the configuration from `CATALOG_*` environment variables,
    /// falling back to [`ServerConfig::default`] for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(addr) = parse_var(&lookup, ENV_BIND_ADDR)? {
            config.bind_addr = addr;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(size) = parse_positive(&lookup, ENV_MAILBOX_SIZE)? {
            config.mailbox_size = size;
        }
        if let Some(size) = parse_positive(&lookup, ENV_SUBSCRIBER_BUFFER)? {
            config.subscriber_buffer = size;
        }
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], 8080)), "data")
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    value.trim().parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: e.to_string(),
    })
}

// tokio channels panic on a zero capacity
fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<usize>, ConfigError> {
    match parse_var::<usize>(lookup, key)? {
        Some(0) => Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        other => Ok(other),
    }
}
