//! Type definitions module
//!
//! - `response` - the JSON envelope returned by every endpoint

pub mod response;

// Re-export commonly used types at module level
pub use response::ApiResponse;
