//! OTP lifecycle module
//!
//! Issuance and verification of numeric one-time passcodes:
//! - Gating through the rate limiter and the block guard
//! - Single-flight active record per phone number with a store TTL
//! - Anti-reuse against the issuance history
//! - Attempt counting and lockout, with blocks and history appends run in the background

mod generator;
mod service;
mod side_effects;
mod types;


pub use generator::{CodeGenerator, RandomCodeGenerator, MAX_DIGITS};
pub use service::{otp_key, OtpService};
pub use side_effects::{ChannelSink, SideEffectFailure, SideEffectKind, SideEffectSink, SideEffects, TracingSink};
pub use types::{OtpStatus, VerifyOutcome};
