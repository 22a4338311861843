//! Route registration

pub mod otp;

use actix_web::web;

/// Mount every API route (under `/api`)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(otp::configure);
}
