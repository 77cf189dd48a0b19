//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

use crate::app::summary::PollPolicy;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub database_url: String,
    pub log_level: Level,
    pub oauth_callback_address: SocketAddr,
    pub session_check_interval: Duration,
    pub summary_poll: PollPolicy,
    pub http_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend and Storage ---
        let api_base_url = lookup("API_BASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("API_BASE_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "API_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }

        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://chaekgoeul.db?mode=rwc".to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let oauth_callback_address: SocketAddr =
            parse_or(&lookup, "OAUTH_CALLBACK_ADDRESS", "127.0.0.1:3737".parse().ok())?;

        // --- Timing ---
        let session_check_interval =
            Duration::from_millis(parse_or(&lookup, "SESSION_CHECK_INTERVAL_MS", Some(60_000))?);
        if session_check_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "SESSION_CHECK_INTERVAL_MS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }
        let summary_poll = PollPolicy {
            interval: Duration::from_millis(parse_or(&lookup, "SUMMARY_POLL_INTERVAL_MS", Some(5_000))?),
            max_attempts: parse_or(&lookup, "SUMMARY_MAX_ATTEMPTS", Some(10))?,
        };
        if summary_poll.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "SUMMARY_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let http_timeout = Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECS", Some(30))?);

        Ok(Self {
            api_base_url,
            database_url,
            log_level,
            oauth_callback_address,
            session_check_interval,
            summary_poll,
            http_timeout,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(key.to_string())),
    }
}
