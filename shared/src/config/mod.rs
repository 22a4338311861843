//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `cache` - Key-value store backend and Redis connection
//! - `environment` - Environment detection and logging configuration
//! - `otp` - Code length, expiry, attempt and history limits
//! - `rate_limit` - Per-address request window and identity lockout
//! - `server` - HTTP server binding

pub mod cache;
pub mod environment;
pub mod otp;
pub mod rate_limit;
pub mod server;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Re-export commonly used types
pub use cache::{CacheConfig, StoreBackend};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::{HistoryConfig, OtpConfig, MAX_OTP_DIGITS};
pub use rate_limit::{BlockConfig, RateLimitConfig};
pub use server::ServerConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Store configuration
    pub cache: CacheConfig,

    /// OTP issuance and verification configuration
    pub otp: OtpConfig,

    /// Per-address rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Identity lockout configuration
    pub block: BlockConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            otp: OtpConfig::default(),
            rate_limit: RateLimitConfig::default(),
            block: BlockConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        Self {
            environment,
            server: ServerConfig::from_env(),
            cache: CacheConfig::from_env(),
            otp: OtpConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            block: BlockConfig::from_env(),
            logging: LoggingConfig::from_env(environment),
        }
    }
}

/// Read and parse an environment variable, falling back to `default`
/// when it is unset or does not parse.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
