//! Application configuration management
//!
//! This module handles loading and validating configuration from environment
//! variables. All configuration is loaded at startup and validated before the
//! engine runs.

use std::env;
use std::sync::LazyLock;

use crate::constants::{
    DEFAULT_BROADCAST_CAPACITY, DEFAULT_COUNTDOWN_MINUTES, DEFAULT_ENDING_SOON_LEAD_MINUTES,
    DEFAULT_PROMOTION_QUOTA,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub realtime: RealtimeConfig,
    pub rust_log: String,
}

/// Advancement engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Promotion quota applied when a caller does not supply one
    pub default_quota: u32,
    /// Minutes before effective end at which round_ending_soon fires
    pub ending_soon_lead_minutes: i64,
    /// Countdown duration applied to countdown rounds created without one
    pub default_countdown_minutes: i64,
}

/// Real-time broadcast configuration
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Capacity of the in-process broadcast channel
    pub broadcast_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            engine: EngineConfig::from_env()?,
            realtime: RealtimeConfig::from_env()?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl EngineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            default_quota: env::var("DEFAULT_PROMOTION_QUOTA")
                .unwrap_or_else(|_| DEFAULT_PROMOTION_QUOTA.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DEFAULT_PROMOTION_QUOTA".to_string()))?,
            ending_soon_lead_minutes: env::var("ENDING_SOON_LEAD_MINUTES")
                .unwrap_or_else(|_| DEFAULT_ENDING_SOON_LEAD_MINUTES.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("ENDING_SOON_LEAD_MINUTES".to_string()))?,
            default_countdown_minutes: env::var("DEFAULT_COUNTDOWN_MINUTES")
                .unwrap_or_else(|_| DEFAULT_COUNTDOWN_MINUTES.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DEFAULT_COUNTDOWN_MINUTES".to_string()))?,
        })
    }
}

impl RealtimeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            broadcast_capacity: env::var("BROADCAST_CAPACITY")
                .unwrap_or_else(|_| DEFAULT_BROADCAST_CAPACITY.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BROADCAST_CAPACITY".to_string()))?,
        })
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
