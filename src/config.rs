//! Configuration module
//!
//! Everything the server and the load test need comes from the process
//! environment (optionally seeded from `.env` by the caller).

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings for the ledger service
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string (`DATABASE_URL`)
    pub database_url: String,

    /// Pool size shared by HTTP handlers and transfers
    pub database_max_connections: u32,

    pub host: String,
    pub port: u16,

    /// `development` or `production`; production switches logs to JSON
    pub environment: String,

    /// Default deadline for `Store::exec_tx`. `None` means unbounded.
    pub transaction_timeout: Option<Duration>,
}

impl Config {
    /// Read settings from the environment, falling back to local defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let timeout_ms = parse_var("TRANSACTION_TIMEOUT_MS", 5000)?;

        Ok(Self {
            database_url,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 3000)?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            transaction_timeout: timeout_from_millis(timeout_ms),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Parse `name` if set, otherwise use `default`
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name))
}

/// Zero turns the deadline off
fn timeout_from_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
