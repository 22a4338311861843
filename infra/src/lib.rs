//! # Infrastructure Layer
//!
//! Concrete store backends for OtpGuard. The Redis client implements the
//! [`og_core::KeyValueStore`] contract so the OTP services run unchanged
//! against a shared Redis deployment; [`create_store`] picks the backend
//! from configuration.

use std::sync::Arc;

use og_core::{InMemoryStore, KeyValueStore, StoreError};
use og_shared::{CacheConfig, StoreBackend};

/// Cache module - Redis client and store operations
pub mod cache;

pub use cache::RedisClient;

/// Build the configured store backend
///
/// Redis connections are established (with retries) before this returns.
pub async fn create_store(
    config: &CacheConfig,
) -> Result<Arc<dyn KeyValueStore>, InfrastructureError> {
    match config.backend {
        StoreBackend::Redis => Ok(Arc::new(RedisClient::new(config.clone()).await?)),
        StoreBackend::Memory => {
            tracing::warn!(
                "Using the in-memory store; state is not shared between instances"
            );
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for StoreError {
    fn from(err: InfrastructureError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_store() {
        let store = create_store(&CacheConfig::memory()).await.unwrap();
        assert!(store.ping().await.unwrap());
        assert_eq!(store.incr("counter").await.unwrap(), 1);
    }

    #[test]
    fn test_error_converts_to_store_error() {
        let err: StoreError = InfrastructureError::Config("bad url".into()).into();
        assert_eq!(
            err,
            StoreError::Backend("Configuration error: bad url".to_string())
        );
    }
}
