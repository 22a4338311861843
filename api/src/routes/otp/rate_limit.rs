use actix_web::{web, HttpRequest, HttpResponse};

use og_shared::{error_codes, ApiResponse};

use crate::app::AppState;
use crate::dto::{RateLimitQuery, RateLimitResponse};
use crate::middleware::client_ip;

/// Handler for GET /api/otp/ratelimit?phone_number=...
///
/// The limiter is keyed by client address; like any check, this call
/// counts against the caller's window.
pub async fn rate_limit_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<RateLimitQuery>,
) -> HttpResponse {
    let has_phone = query
        .phone_number
        .as_deref()
        .map_or(false, |p| !p.trim().is_empty());
    if !has_phone {
        return HttpResponse::BadRequest().json(ApiResponse::error(
            error_codes::VALIDATION_ERROR,
            "Phone number is required",
        ));
    }

    let decision = state.otp_service.check_rate_limit(&client_ip(&req)).await;
    HttpResponse::Ok().json(ApiResponse::success(RateLimitResponse {
        is_allowed: decision.allowed,
        time_to_reset: decision.retry_after_seconds.unwrap_or(0),
    }))
}
