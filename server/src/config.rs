//! Process configuration, read once at startup.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: selects the PostgreSQL backend when set and non-blank
//! - `APP_ENV`: `production` requires TLS for the database connection
//! - `HOST`: listen address (default: `0.0.0.0`)
//! - `PORT`: listen port (default: `3001`)
//! - `DATA_FILE`: JSON file used when no database is configured (default: `todos.json`)

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

use crate::store::PostgresOptions;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DATA_FILE: &str = "todos.json";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),

    #[error("invalid HOST value: {0}")]
    InvalidHost(String),
}

/// Which persistence backend the process runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    File(PathBuf),
    Postgres(PostgresOptions),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub storage: StorageBackend,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = match var("HOST") {
            Some(host) => host
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidHost(host))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match var("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(port))?,
            None => DEFAULT_PORT,
        };

        let production = var("APP_ENV").is_some_and(|value| value.eq_ignore_ascii_case("production"));
        let storage = match var("DATABASE_URL") {
            Some(url) => StorageBackend::Postgres(PostgresOptions {
                url,
                require_tls: production,
                max_connections: DEFAULT_MAX_CONNECTIONS,
            }),
            None => StorageBackend::File(
                var("DATA_FILE").map_or_else(|| PathBuf::from(DEFAULT_DATA_FILE), PathBuf::from),
            ),
        };

        Ok(Self {
            listen_addr: SocketAddr::new(host, port),
            storage,
        })
    }
}
