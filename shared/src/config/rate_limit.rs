//! Rate limiting and lockout configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// Fixed-window rate limiting per network address
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Max requests per address per window
    pub max_requests: u32,

    /// Window length in seconds
    pub window_seconds: u64,
}

/// Temporary identity lockout after attempt exhaustion
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockConfig {
    /// Lockout duration in seconds
    pub duration_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_seconds: 60,
        }
    }
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 3600, // 1 hour
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration with explicit limits
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: env_or("MAX_IP_ATTEMPTS", defaults.max_requests),
            window_seconds: env_or("WINDOW_SECONDS", defaults.window_seconds),
        }
    }
}

impl BlockConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            duration_seconds: env_or("USER_BLOCK_DURATION", Self::default().duration_seconds),
        }
    }
}
