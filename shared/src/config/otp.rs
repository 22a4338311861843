//! OTP issuance and verification configuration

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::env_or;

/// Longest code whose numeric range fits in a `u64`
pub const MAX_OTP_DIGITS: u32 = 18;

/// Settings for the OTP lifecycle
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Number of digits in an issued code
    pub digits: u32,

    /// Seconds an issued code stays valid
    pub expiry_seconds: u64,

    /// Failed verifications allowed before the identity is locked out
    pub max_attempts: u32,

    /// Upper bound on regenerations when a candidate collides with history
    #[serde(default = "default_max_regenerations")]
    pub max_regenerations: u32,

    /// Recently issued code tracking
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Recently-issued code history settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Maximum entries kept per identity
    pub max_size: u32,

    /// Days the history list survives after the latest issuance
    pub retention_days: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            digits: 4,
            expiry_seconds: 120,
            max_attempts: 10,
            max_regenerations: default_max_regenerations(),
            history: HistoryConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            retention_days: 7,
        }
    }
}

impl OtpConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            digits: checked_digits(env_or("OTP_DIGITS", defaults.digits)),
            expiry_seconds: env_or("OTP_EXPIRY_TIME", defaults.expiry_seconds),
            max_attempts: env_or("MAX_OTP_ATTEMPTS", defaults.max_attempts),
            max_regenerations: env_or("OTP_MAX_REGENERATIONS", defaults.max_regenerations),
            history: HistoryConfig::from_env(),
        }
    }

    /// Expiry window in milliseconds
    pub fn expiry_millis(&self) -> i64 {
        (self.expiry_seconds as i64).saturating_mul(1000)
    }
}

impl HistoryConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: env_or("MAX_OTP_HISTORY", defaults.max_size),
            retention_days: env_or("HISTORY_EXPIRY_DAYS", defaults.retention_days),
        }
    }

    /// Retention window in seconds
    pub fn retention_seconds(&self) -> u64 {
        self.retention_days.saturating_mul(24 * 60 * 60)
    }
}

/// Clamp a configured code length into `1..=MAX_OTP_DIGITS`
fn checked_digits(digits: u32) -> u32 {
    let clamped = digits.clamp(1, MAX_OTP_DIGITS);
    if clamped != digits {
        warn!(
            configured = digits,
            using = clamped,
            "OTP_DIGITS out of range, clamping"
        );
    }
    clamped
}

fn default_max_regenerations() -> u32 {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_retention_seconds() {
        let config = HistoryConfig::default();
        assert_eq!(config.retention_seconds(), 7 * 86_400);
    }

    #[test]
    fn test_digits_are_clamped() {
        assert_eq!(checked_digits(0), 1);
        assert_eq!(checked_digits(6), 6);
        assert_eq!(checked_digits(19), MAX_OTP_DIGITS);
    }

    #[test]
    fn test_expiry_millis() {
        let config = OtpConfig::default();
        assert_eq!(config.expiry_millis(), 120_000);
    }
}
