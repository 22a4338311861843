//! Domain error types for the OTP lifecycle.
//!
//! Callers branch on [`OtpError`] variants; the display strings are for
//! humans and logs only.

use og_shared::error_codes;
use thiserror::Error;

pub use crate::store::StoreError;

/// Failures surfaced by issuance, verification and the gates in front of them
#[derive(Error, Debug)]
pub enum OtpError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Rate limit exceeded. Try again in {retry_after_seconds} seconds.")]
    Throttled { retry_after_seconds: u64 },

    #[error("User is temporarily blocked. Try again in {retry_after_seconds} seconds.")]
    Blocked { retry_after_seconds: u64 },

    #[error("An active OTP already exists for this phone number")]
    Conflict,

    #[error("OTP not found or expired")]
    NotFoundOrExpired,

    #[error("Invalid OTP")]
    InvalidCode,

    #[error("Maximum attempts exceeded")]
    LockedOut,

    #[error("No unused code found after {attempts} generation attempts")]
    CodeSpaceExhausted { attempts: u32 },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl OtpError {
    /// Shorthand for a missing or empty request field
    pub fn validation(field: impl Into<String>) -> Self {
        let field = field.into();
        OtpError::Validation {
            message: format!("{} is required", field),
            field,
        }
    }

    /// A field that is present but out of range
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        OtpError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the failure is attributable to the caller (4xx) rather than the service (5xx)
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            OtpError::Storage(_) | OtpError::CodeSpaceExhausted { .. }
        )
    }

    /// Seconds the caller should wait before retrying, when known
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            OtpError::Throttled {
                retry_after_seconds,
            }
            | OtpError::Blocked {
                retry_after_seconds,
            } => Some(*retry_after_seconds),
            _ => None,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            OtpError::Validation { .. } => error_codes::VALIDATION_ERROR,
            OtpError::Throttled { .. } => error_codes::RATE_LIMIT_EXCEEDED,
            OtpError::Blocked { .. } => error_codes::USER_BLOCKED,
            OtpError::Conflict => error_codes::OTP_ALREADY_ACTIVE,
            OtpError::NotFoundOrExpired => error_codes::OTP_NOT_FOUND,
            OtpError::InvalidCode => error_codes::INVALID_OTP,
            OtpError::LockedOut => error_codes::MAX_ATTEMPTS_EXCEEDED,
            OtpError::CodeSpaceExhausted { .. } => error_codes::CODE_SPACE_EXHAUSTED,
            OtpError::Storage(_) => error_codes::STORE_ERROR,
        }
    }
}

pub type OtpResult<T> = Result<T, OtpError>;
