//! Temporary identity lockout backed by a TTL key

use og_shared::BlockConfig;
use std::sync::Arc;

use crate::store::{KeyValueStore, StoreResult};

/// Store key of the block record for an identity
pub fn block_key(identity: &str) -> String {
    format!("blocked:user:{}", identity)
}

/// Current block state of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStatus {
    pub blocked: bool,
    pub retry_after_seconds: Option<u64>,
}

impl BlockStatus {
    pub fn clear() -> Self {
        Self {
            blocked: false,
            retry_after_seconds: None,
        }
    }
}

/// Block records expire on their own; there is no unblock operation
pub struct BlockGuard {
    store: Arc<dyn KeyValueStore>,
    config: BlockConfig,
}

impl BlockGuard {
    pub fn new(store: Arc<dyn KeyValueStore>, config: BlockConfig) -> Self {
        Self { store, config }
    }

    /// Blocked exactly while the block record has a positive TTL
    pub async fn is_blocked(&self, identity: &str) -> StoreResult<BlockStatus> {
        match self.store.ttl(&block_key(identity)).await? {
            Some(ttl) if ttl > 0 => Ok(BlockStatus {
                blocked: true,
                retry_after_seconds: Some(ttl as u64),
            }),
            _ => Ok(BlockStatus::clear()),
        }
    }

    /// (Re)create the block record for the full configured duration
    pub async fn block(&self, identity: &str) -> StoreResult<()> {
        self.store
            .set_with_expiry(&block_key(identity), "1", self.config.duration_seconds)
            .await
    }
}
