//! CORS middleware configuration for cross-origin requests.
//!
//! Development is permissive so the API can be exercised from any local
//! tool; staging and production only admit the configured origins.

use actix_cors::Cors;
use actix_web::http::{header, Method};
use og_shared::Environment;

/// Creates a CORS middleware instance for the given environment.
pub fn create_cors(environment: Environment, allowed_origins: &[String]) -> Cors {
    if environment.is_development() {
        create_development_cors()
    } else {
        create_production_cors(allowed_origins)
    }
}

fn create_development_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
        .max_age(3600)
}

fn create_production_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600);

    for origin in allowed_origins.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        tracing::info!("Adding allowed origin: {}", origin);
        cors = cors.allowed_origin(origin);
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_rt::test]
    async fn test_production_rejects_unknown_origin() {
        let origins = vec!["https://app.example.com".to_string()];
        let app = test::init_service(
            App::new()
                .wrap(create_cors(Environment::Production, &origins))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let allowed = test::TestRequest::get()
            .uri("/")
            .insert_header(("Origin", "https://app.example.com"))
            .to_request();
        let resp = test::call_service(&app, allowed).await;
        assert!(resp.status().is_success());
        assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let denied = test::TestRequest::get()
            .uri("/")
            .insert_header(("Origin", "https://evil.example.com"))
            .to_request();
        let resp = test::call_service(&app, denied).await;
        assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[actix_rt::test]
    async fn test_development_allows_any_origin() {
        let app = test::init_service(
            App::new()
                .wrap(create_cors(Environment::Development, &[]))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("Origin", "http://localhost:5173"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
