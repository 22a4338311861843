//! Shared utilities and common types for the OtpGuard server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types loaded from the environment
//! - Error codes and the JSON response envelope
//! - Utility functions (phone masking for logs)

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, BlockConfig, CacheConfig, Environment, HistoryConfig, LoggingConfig,
    OtpConfig, RateLimitConfig, ServerConfig, StoreBackend,
};
pub use errors::error_codes;
pub use types::ApiResponse;
pub use utils::phone;
