use actix_web::{web, HttpResponse};

use og_shared::{error_codes, ApiResponse};

use crate::app::AppState;
use crate::dto::OtpStatusResponse;
use crate::handlers::error::error_response;

/// Handler for GET /api/otp/status/{phone_number}
pub async fn otp_status(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let phone = path.into_inner();

    match state.otp_service.status(&phone).await {
        Ok(Some(status)) => HttpResponse::Ok().json(ApiResponse::success(OtpStatusResponse {
            has_active_otp: true,
            attempts: status.attempts,
        })),
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::error(
            error_codes::OTP_NOT_FOUND,
            "No active OTP found",
        )),
        Err(error) => error_response(&error),
    }
}
