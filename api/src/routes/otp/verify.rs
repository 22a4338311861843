use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use og_shared::{phone::mask_phone_number, ApiResponse};

use crate::app::AppState;
use crate::dto::VerifyOtpRequest;
use crate::handlers::error::{error_response, validation_response};
use crate::middleware::client_ip;

/// Handler for POST /api/otp/verify
///
/// `otp` may be a JSON string or number. A wrong code and a lockout are
/// both 400s with distinct messages ("Invalid OTP" and "Maximum attempts
/// exceeded").
pub async fn verify_otp(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<VerifyOtpRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_response(&errors);
    }

    let phone = request.phone_number();
    let code = request.code();
    let ip = client_ip(&req);
    tracing::info!(phone = %mask_phone_number(phone), ip = %ip, "Processing OTP verification request");

    let result = state
        .otp_service
        .verify(phone, &code, &ip)
        .await
        .and_then(|outcome| outcome.into_result());

    match result {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::ok("OTP verified successfully")),
        Err(error) => error_response(&error),
    }
}
