use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;

use og_api::{create_app, telemetry, AppState};
use og_core::OtpService;
use og_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_tracing(&config.logging)?;

    info!(environment = %config.environment, "Starting OtpGuard API server");

    let store = og_infra::create_store(&config.cache)
        .await
        .context("Failed to initialise the key-value store")?;

    // Worker runtimes stop with the server; effects run on this one so the
    // drain below can still complete them
    let otp_service = Arc::new(
        OtpService::new(
            store.clone(),
            config.otp.clone(),
            config.rate_limit.clone(),
            config.block.clone(),
        )
        .with_runtime(tokio::runtime::Handle::current()),
    );

    let state = web::Data::new(
        AppState::new(otp_service.clone(), store)
            .with_cors(config.environment, config.server.allowed_origins.clone()),
    );

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await?;

    info!(
        pending = otp_service.side_effects().pending(),
        "Server stopped, waiting for background side effects"
    );
    otp_service.drain().await;
    Ok(())
}
