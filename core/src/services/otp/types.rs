//! Result types for the OTP lifecycle

use serde::Serialize;

use crate::errors::{OtpError, OtpResult};

/// Terminal outcome of a verification that passed both gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// Code matched; the record is consumed
    Success,
    /// Wrong code; the attempt was counted
    Invalid,
    /// Attempts exhausted; the record is gone and the identity is being blocked
    LockedOut,
}

impl VerifyOutcome {
    /// Map the non-success outcomes onto their error kinds
    pub fn into_result(self) -> OtpResult<()> {
        match self {
            VerifyOutcome::Success => Ok(()),
            VerifyOutcome::Invalid => Err(OtpError::InvalidCode),
            VerifyOutcome::LockedOut => Err(OtpError::LockedOut),
        }
    }
}

/// Snapshot of an active OTP record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OtpStatus {
    pub attempts: u32,
}
