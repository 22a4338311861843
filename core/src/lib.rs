//! # OtpGuard Core
//!
//! Core business logic for the OtpGuard backend: the OTP lifecycle state
//! machine and its three governance subsystems (rate limiting, blocking and
//! history deduplication), all expressed against the [`store::KeyValueStore`]
//! contract so they run unchanged on Redis or the in-memory store.

pub mod errors;
pub mod services;
pub mod store;

// Re-export commonly used types for convenience
pub use errors::{OtpError, OtpResult};
pub use services::*;
pub use store::{InMemoryStore, KeyValueStore, StoreCommand, StoreError, StoreResult};
