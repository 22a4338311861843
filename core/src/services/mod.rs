//! Business services: the OTP lifecycle and the governance around it.

pub mod block;
pub mod history;
pub mod otp;
pub mod rate_limit;

// Re-export commonly used types
pub use block::{BlockGuard, BlockStatus};
pub use history::{HistoryEntry, HistoryTracker};
pub use otp::{
    ChannelSink, CodeGenerator, OtpService, OtpStatus, RandomCodeGenerator, SideEffectFailure,
    SideEffectKind, SideEffectSink, SideEffects, TracingSink, VerifyOutcome,
};
pub use rate_limit::{RateLimitDecision, RateLimiter};
