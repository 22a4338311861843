//! Shared error codes

/// Stable error codes returned in the `error` field of failed responses
pub mod error_codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
    pub const USER_BLOCKED: &str = "USER_BLOCKED";
    pub const OTP_ALREADY_ACTIVE: &str = "OTP_ALREADY_ACTIVE";
    pub const OTP_NOT_FOUND: &str = "OTP_NOT_FOUND";
    pub const INVALID_OTP: &str = "INVALID_OTP";
    pub const MAX_ATTEMPTS_EXCEEDED: &str = "MAX_ATTEMPTS_EXCEEDED";
    pub const CODE_SPACE_EXHAUSTED: &str = "CODE_SPACE_EXHAUSTED";
    pub const STORE_ERROR: &str = "STORE_ERROR";
}
