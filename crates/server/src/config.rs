//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDERHUB_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to the generic `DATABASE_URL`)
//!
//! ## Optional
//! - `ORDERHUB_HOST` - Bind address (default: 127.0.0.1)
//! - `ORDERHUB_PORT` - Listen port (default: 8081)
//! - `ORDERHUB_STATIC_DIR` - Directory with the lookup page
//!   (default: crates/server/static)
//! - `ORDERHUB_REQUEST_TIMEOUT_SECS` - Per-request deadline (default: 15)
//! - `ORDERHUB_INGEST_BUFFER` - Feed channel capacity (default: 256)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Orderhub application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding the static lookup page
    pub static_dir: String,
    /// Per-request deadline applied at the router
    pub request_timeout: Duration,
    /// Capacity of the ingestion feed channel
    pub ingest_buffer: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ORDERHUB_DATABASE_URL")?;
        let host = get_env_or_default("ORDERHUB_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORDERHUB_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("ORDERHUB_PORT", "8081")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORDERHUB_PORT".to_owned(), e.to_string()))?;
        let static_dir = get_env_or_default("ORDERHUB_STATIC_DIR", "crates/server/static");
        let request_timeout = get_env_or_default("ORDERHUB_REQUEST_TIMEOUT_SECS", "15")
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ORDERHUB_REQUEST_TIMEOUT_SECS".to_owned(), e.to_string())
            })?;
        let ingest_buffer = get_env_or_default("ORDERHUB_INGEST_BUFFER", "256")
            .parse::<usize>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ORDERHUB_INGEST_BUFFER".to_owned(), e.to_string())
            })?;

        Ok(Self {
            database_url,
            host,
            port,
            static_dir,
            request_timeout,
            ingest_buffer,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
