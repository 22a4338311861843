//! Application state and factory
//!
//! This module holds the shared state handed to every handler and the
//! factory that assembles the Actix-web application around it.

use std::sync::Arc;

use actix_web::{web, App, HttpResponse};
use tracing_actix_web::TracingLogger;

use og_core::{KeyValueStore, OtpService};
use og_shared::{error_codes, ApiResponse, Environment};

use crate::handlers::error::{json_error_handler, query_error_handler};
use crate::middleware::cors::create_cors;
use crate::routes;

/// Application state that holds shared services
pub struct AppState {
    pub otp_service: Arc<OtpService>,
    /// Store handle for health checks
    pub store: Arc<dyn KeyValueStore>,
    pub environment: Environment,
    /// Origins allowed by CORS outside development
    pub allowed_origins: Vec<String>,
}

impl AppState {
    pub fn new(otp_service: Arc<OtpService>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            otp_service,
            store,
            environment: Environment::default(),
            allowed_origins: Vec::new(),
        }
    }

    pub fn with_cors(mut self, environment: Environment, allowed_origins: Vec<String>) -> Self {
        self.environment = environment;
        self.allowed_origins = allowed_origins;
        self
    }
}

/// Create and configure the application with all dependencies
pub fn create_app(
    app_state: web::Data<AppState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let cors = create_cors(app_state.environment, &app_state.allowed_origins);

    App::new()
        .app_data(app_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        // Middleware order: CORS innermost, tracing span around everything
        .wrap(cors)
        .wrap(TracingLogger::default())
        // Health check endpoint
        .route("/health", web::get().to(health_check))
        .service(web::scope("/api").configure(routes::configure))
        // Default 404 handler
        .default_service(web::route().to(not_found))
}

/// Health check endpoint handler
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let store_ok = matches!(state.store.ping().await, Ok(true));
    let body = serde_json::json!({
        "status": if store_ok { "healthy" } else { "degraded" },
        "service": "otpguard-api",
        "version": env!("CARGO_PKG_VERSION"),
        "store": if store_ok { "up" } else { "down" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    if store_ok {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
