//! Mapping of domain errors onto HTTP responses
//!
//! Every failure is rendered as an [`ApiResponse`] with `success: false`,
//! the stable error code and a human-readable message. Caller mistakes are
//! 400s; store failures and an exhausted code space are 500s.

use actix_web::{
    error::{InternalError, JsonPayloadError, QueryPayloadError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use validator::ValidationErrors;

use og_core::OtpError;
use og_shared::{error_codes, ApiResponse};

/// HTTP status for a domain error
pub fn status_for(error: &OtpError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Render a domain error
pub fn error_response(error: &OtpError) -> HttpResponse {
    let status = status_for(error);
    if status.is_server_error() {
        tracing::error!(code = error.code(), error = %error, "Request failed");
    } else {
        tracing::debug!(code = error.code(), error = %error, "Request rejected");
    }

    // Store details stay in the logs
    let message = match error {
        OtpError::Storage(_) => "Internal server error".to_string(),
        other => other.to_string(),
    };
    let mut response = HttpResponse::build(status);
    if let Some(seconds) = error.retry_after_seconds() {
        response.insert_header((header::RETRY_AFTER, seconds.to_string()));
    }
    response.json(ApiResponse::error(error.code(), message))
}

/// Render the first failed field of a request body
pub fn validation_response(errors: &ValidationErrors) -> HttpResponse {
    let message = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid request".to_string());

    HttpResponse::BadRequest().json(ApiResponse::error(error_codes::VALIDATION_ERROR, message))
}

/// Malformed JSON bodies become 400s in the standard envelope
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = format!("Invalid JSON body: {}", err);
    let response =
        HttpResponse::BadRequest().json(ApiResponse::error(error_codes::BAD_REQUEST, &message));
    InternalError::from_response(message, response).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = format!("Invalid query string: {}", err);
    let response =
        HttpResponse::BadRequest().json(ApiResponse::error(error_codes::BAD_REQUEST, &message));
    InternalError::from_response(message, response).into()
}
