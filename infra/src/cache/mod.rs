//! Cache module for the Redis-backed store
//!
//! Connection management with retry on startup, and the Redis rendition of
//! every store primitive the OTP services use.

pub mod redis_client;


pub use redis_client::RedisClient;

// Re-export commonly used types
pub use og_shared::config::cache::CacheConfig;
