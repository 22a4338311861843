//! Key-value store contract
//!
//! Every piece of OTP state (active records, blocks, rate counters and
//! history lists) lives behind [`KeyValueStore`]. The contract mirrors the
//! Redis primitives the services need: atomic counters, TTL-bearing keys,
//! hash fields, bounded lists and an all-or-nothing batch.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

pub use memory::InMemoryStore;

/// Store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend is unreachable or rejected the command
    #[error("Store backend error: {0}")]
    Backend(String),

    /// The key holds a value of a different kind than the operation expects
    #[error("Key '{key}' holds the wrong kind of value")]
    WrongType { key: String },

    /// A stored value could not be decoded
    #[error("Corrupt value at '{key}': {message}")]
    Corrupt { key: String, message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A command inside an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    /// Push onto the head of a list
    ListPush { key: String, value: String },
    /// Keep only the inclusive index range of a list
    ListTrim { key: String, start: isize, stop: isize },
    /// Attach a TTL in seconds
    Expire { key: String, seconds: u64 },
    /// Remove a key
    Delete { key: String },
}

impl StoreCommand {
    /// Key the command operates on
    pub fn key(&self) -> &str {
        match self {
            StoreCommand::ListPush { key, .. }
            | StoreCommand::ListTrim { key, .. }
            | StoreCommand::Expire { key, .. }
            | StoreCommand::Delete { key } => key,
        }
    }
}

/// Primitive operations required from the shared key-value service
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomically increment an integer key by one, creating it at zero
    async fn incr(&self, key: &str) -> StoreResult<i64>;

    /// Attach a TTL; returns false when the key does not exist
    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool>;

    /// Remaining TTL in seconds; `None` if the key is absent or never expires
    async fn ttl(&self, key: &str) -> StoreResult<Option<i64>>;

    /// Set a string value with a TTL, replacing any previous value and TTL
    async fn set_with_expiry(&self, key: &str, value: &str, seconds: u64) -> StoreResult<()>;

    /// Read several hash fields in one round trip
    async fn hash_get(&self, key: &str, fields: &[&str]) -> StoreResult<Vec<Option<String>>>;

    /// Create a hash with a TTL only if the key does not exist yet
    ///
    /// Returns true when the hash was created. The existence check, the
    /// field writes and the TTL are applied as one atomic step.
    async fn hash_create_if_absent(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl_seconds: u64,
    ) -> StoreResult<bool>;

    /// Atomically increment a field of an existing hash
    ///
    /// Returns `None` without creating anything when the key is absent, so a
    /// record that expired concurrently is never resurrected without a TTL.
    async fn hash_incr(&self, key: &str, field: &str, delta: i64) -> StoreResult<Option<i64>>;

    /// Delete a key; returns whether it existed
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Read an inclusive range of a list (negative indexes count from the tail)
    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    /// Apply every command or none of them
    async fn exec_atomic(&self, commands: Vec<StoreCommand>) -> StoreResult<()>;

    /// Liveness probe
    async fn ping(&self) -> StoreResult<bool>;
}
