//! Configuration management for the to-do application.
//!
//! Loads configuration from environment variables with local defaults. The
//! binary loads a `.env` file first, if one exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use thiserror::Error;

/// Remote store application identifier
pub const STORE_APP_ID: &str = "LIVELIST_STORE_APP_ID";
/// Identity provider publishable key
pub const IDENTITY_KEY: &str = "LIVELIST_IDENTITY_KEY";
/// Prometheus listen address; metrics are off when unset, an error when empty
pub const METRICS_ADDR: &str = "LIVELIST_METRICS_ADDR";
/// Log filter
pub const LOG_FILTER: &str = "RUST_LOG";

/// Errors from loading configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but empty
    #[error("{0} is set but empty")]
    Empty(&'static str),

    /// A variable could not be parsed
    #[error("{name} is invalid: {value}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Remote store configuration
    pub store: StoreConfig,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

/// Remote store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Application identifier issued by the hosted store
    pub app_id: String,
}

/// Identity provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Publishable (client-side) key
    pub publishable_key: String,
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log filter directives (trace, debug, info, warn, error)
    pub log_filter: String,
    /// Metrics server address (for Prometheus scraping)
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an empty or invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an empty or invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &'static str, default: &str| match lookup(name) {
            Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(name)),
            Some(value) => Ok(value),
            None => Ok(default.to_string()),
        };

        let metrics_addr = match lookup(METRICS_ADDR) {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::Empty(METRICS_ADDR));
            },
            Some(value) => Some(value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: METRICS_ADDR,
                value,
            })?),
            None => None,
        };

        Ok(Self {
            store: StoreConfig {
                app_id: non_empty(STORE_APP_ID, "livelist-local")?,
            },
            identity: IdentityConfig {
                publishable_key: non_empty(IDENTITY_KEY, "pk_local")?,
            },
            observability: ObservabilityConfig {
                log_filter: lookup(LOG_FILTER).unwrap_or_else(|| "info".to_string()),
                metrics_addr,
            },
        })
    }
}
