use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use og_shared::{phone::mask_phone_number, ApiResponse};

use crate::app::AppState;
use crate::dto::{GenerateOtpRequest, GenerateOtpResponse};
use crate::handlers::error::{error_response, validation_response};
use crate::middleware::client_ip;

/// Handler for POST /api/otp/generate
///
/// # Request Body
///
/// ```json
/// { "phone_number": "+8613800138000" }
/// ```
///
/// # Response
///
/// ```json
/// {
///     "success": true,
///     "message": "OTP generated successfully",
///     "data": { "phone_number": "+8613800138000", "otp": "4821" }
/// }
/// ```
pub async fn generate_otp(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<GenerateOtpRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_response(&errors);
    }

    let phone = request.phone_number();
    let ip = client_ip(&req);
    tracing::info!(phone = %mask_phone_number(phone), ip = %ip, "Processing OTP generation request");

    let digits = state.otp_service.config().digits;
    match state.otp_service.issue(phone, &ip, digits).await {
        Ok(otp) => HttpResponse::Ok().json(
            ApiResponse::success(GenerateOtpResponse {
                phone_number: phone.to_string(),
                otp,
            })
            .with_message("OTP generated successfully"),
        ),
        Err(error) => error_response(&error),
    }
}
