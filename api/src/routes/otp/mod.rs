//! OTP route handlers
//!
//! - `POST /otp/generate` issues a code
//! - `POST /otp/verify` checks a submitted code
//! - `GET /otp/status/{phone_number}` reports the active record
//! - `GET /otp/ratelimit` reports (and consumes) the caller's request budget

pub mod generate;
pub mod rate_limit;
pub mod status;
pub mod verify;

use actix_web::web;

pub use generate::generate_otp;
pub use rate_limit::rate_limit_status;
pub use status::otp_status;
pub use verify::verify_otp;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/otp")
            .route("/generate", web::post().to(generate_otp))
            .route("/verify", web::post().to(verify_otp))
            .route("/status/{phone_number}", web::get().to(otp_status))
            .route("/ratelimit", web::get().to(rate_limit_status)),
    );
}
