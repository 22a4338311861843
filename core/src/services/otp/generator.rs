//! Numeric code generation

use rand::Rng;

/// Longest code whose numeric range fits in a `u64`
pub const MAX_DIGITS: u32 = og_shared::config::MAX_OTP_DIGITS;

/// Source of candidate codes
pub trait CodeGenerator: Send + Sync {
    /// Produce a code of exactly `digits` decimal digits with a non-zero leading digit
    fn generate(&self, digits: u32) -> String;
}

/// Uniform generator over `[10^(d-1), 10^d - 1]`
///
/// Not cryptographically hardened; codes are short-lived and attempt-limited.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, digits: u32) -> String {
        let digits = digits.clamp(1, MAX_DIGITS);
        let low = 10u64.pow(digits - 1);
        let high = 10u64.pow(digits) - 1;
        rand::thread_rng().gen_range(low..=high).to_string()
    }
}
