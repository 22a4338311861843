use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateOtpRequest {
    #[validate(
        required(message = "Phone number is required"),
        length(min = 1, message = "Phone number is required")
    )]
    pub phone_number: Option<String>,
}

impl GenerateOtpRequest {
    pub fn phone_number(&self) -> &str {
        self.phone_number.as_deref().unwrap_or_default()
    }
}

/// An OTP as submitted by clients: some send `"1234"`, others `1234`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OtpValue {
    Text(String),
    Number(serde_json::Number),
}

impl OtpValue {
    /// The code as submitted; numbers are written in their decimal form
    pub fn as_code(&self) -> String {
        match self {
            OtpValue::Text(text) => text.clone(),
            OtpValue::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(
        required(message = "Phone number and OTP are required"),
        length(min = 1, message = "Phone number and OTP are required")
    )]
    pub phone_number: Option<String>,
    #[validate(required(message = "Phone number and OTP are required"))]
    pub otp: Option<OtpValue>,
}

impl VerifyOtpRequest {
    pub fn phone_number(&self) -> &str {
        self.phone_number.as_deref().unwrap_or_default()
    }

    pub fn code(&self) -> String {
        self.otp.as_ref().map(OtpValue::as_code).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitQuery {
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOtpResponse {
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpStatusResponse {
    pub has_active_otp: bool,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResponse {
    pub is_allowed: bool,
    /// Seconds until the window resets; 0 when allowed
    pub time_to_reset: u64,
}
