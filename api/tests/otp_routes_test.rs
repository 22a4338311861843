//! Integration tests for the OTP endpoints
//!
//! The full application is assembled over the in-memory store, so these
//! tests exercise routing, extraction, error mapping and the lifecycle
//! together.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, web};
    use serde_json::{json, Value};

    use og_api::{create_app, AppState};
    use og_core::{InMemoryStore, OtpService};
    use og_shared::{BlockConfig, OtpConfig, RateLimitConfig};

    const PHONE: &str = "+8613800138000";

    fn state(max_attempts: u32, max_requests: u32) -> web::Data<AppState> {
        let store = Arc::new(InMemoryStore::new());
        let service = OtpService::new(
            store.clone(),
            OtpConfig {
                max_attempts,
                ..OtpConfig::default()
            },
            RateLimitConfig::new(max_requests, 60),
            BlockConfig::default(),
        );
        web::Data::new(AppState::new(Arc::new(service), store))
    }

    macro_rules! send {
        ($app:expr, $req:expr) => {{
            let resp = test::call_service(&$app, $req.to_request()).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    fn post(uri: &str, body: Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header(("X-Forwarded-For", "203.0.113.9"))
            .set_json(body)
    }

    #[actix_rt::test]
    async fn test_generate_verify_roundtrip() {
        let app = test::init_service(create_app(state(10, 100))).await;

        let (status, body) = send!(app, post("/api/otp/generate", json!({ "phone_number": PHONE })));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "OTP generated successfully");
        assert_eq!(body["data"]["phone_number"], PHONE);
        let otp = body["data"]["otp"].as_str().unwrap().to_string();
        assert_eq!(otp.len(), 4);

        let (status, body) = send!(
            app,
            test::TestRequest::get().uri(&format!("/api/otp/status/{}", PHONE))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({ "has_active_otp": true, "attempts": 0 }));

        // Numeric otp is accepted
        let numeric: u64 = otp.parse().unwrap();
        let (status, body) = send!(
            app,
            post("/api/otp/verify", json!({ "phone_number": PHONE, "otp": numeric }))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "OTP verified successfully" }));

        let (status, body) = send!(
            app,
            test::TestRequest::get().uri(&format!("/api/otp/status/{}", PHONE))
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No active OTP found");
    }

    #[actix_rt::test]
    async fn test_second_generate_conflicts() {
        let app = test::init_service(create_app(state(10, 100))).await;

        let (status, _) = send!(app, post("/api/otp/generate", json!({ "phone_number": PHONE })));
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send!(app, post("/api/otp/generate", json!({ "phone_number": PHONE })));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "OTP_ALREADY_ACTIVE");
    }

    #[actix_rt::test]
    async fn test_missing_fields_are_rejected() {
        let app = test::init_service(create_app(state(10, 100))).await;

        let (status, body) = send!(app, post("/api/otp/generate", json!({})));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Phone number is required");

        let (status, body) = send!(app, post("/api/otp/verify", json!({ "phone_number": PHONE })));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Phone number and OTP are required");

        let (status, body) = send!(app, test::TestRequest::get().uri("/api/otp/ratelimit"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[actix_rt::test]
    async fn test_padded_code_counts_as_a_wrong_attempt() {
        let app = test::init_service(create_app(state(10, 100))).await;

        let (_, body) = send!(app, post("/api/otp/generate", json!({ "phone_number": PHONE })));
        let otp = body["data"]["otp"].as_str().unwrap().to_string();

        let (status, body) = send!(
            app,
            post(
                "/api/otp/verify",
                json!({ "phone_number": PHONE, "otp": format!("  {}  ", otp) })
            )
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid OTP");

        let (_, body) = send!(
            app,
            test::TestRequest::get().uri(&format!("/api/otp/status/{}", PHONE))
        );
        assert_eq!(body["data"]["attempts"], 1);

        let (status, _) = send!(
            app,
            post("/api/otp/verify", json!({ "phone_number": PHONE, "otp": otp }))
        );
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_rt::test]
    async fn test_phone_number_is_used_as_submitted() {
        let app = test::init_service(create_app(state(10, 100))).await;
        let padded = format!(" {}", PHONE);

        let (status, _) = send!(app, post("/api/otp/generate", json!({ "phone_number": PHONE })));
        assert_eq!(status, StatusCode::OK);

        // A differently written identity is a different record
        let (status, body) = send!(app, post("/api/otp/generate", json!({ "phone_number": padded })));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["phone_number"], padded);

        let (status, body) = send!(app, post("/api/otp/generate", json!({ "phone_number": "   " })));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[actix_rt::test]
    async fn test_malformed_json_is_a_bad_request() {
        let app = test::init_service(create_app(state(10, 100))).await;

        let req = test::TestRequest::post()
            .uri("/api/otp/generate")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json");
        let (status, body) = send!(app, req);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BAD_REQUEST");
    }

    #[actix_rt::test]
    async fn test_lockout_then_blocked() {
        let data = state(3, 100);
        let app = test::init_service(create_app(data.clone())).await;

        let (_, body) = send!(app, post("/api/otp/generate", json!({ "phone_number": PHONE })));
        let otp = body["data"]["otp"].as_str().unwrap().to_string();
        let wrong = if otp == "9999" { "1000" } else { "9999" };

        for expected in ["Invalid OTP", "Invalid OTP", "Maximum attempts exceeded"] {
            let (status, body) = send!(
                app,
                post("/api/otp/verify", json!({ "phone_number": PHONE, "otp": wrong }))
            );
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], expected);
        }

        data.otp_service.drain().await;

        let (status, body) = send!(
            app,
            post("/api/otp/verify", json!({ "phone_number": PHONE, "otp": otp }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "USER_BLOCKED");
    }

    #[actix_rt::test]
    async fn test_rate_limit_endpoint() {
        let app = test::init_service(create_app(state(10, 2))).await;
        let uri = format!("/api/otp/ratelimit?phone_number={}", "13800138000");

        for _ in 0..2 {
            let (status, body) = send!(
                app,
                test::TestRequest::get()
                    .uri(&uri)
                    .insert_header(("X-Forwarded-For", "198.51.100.20"))
            );
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"], json!({ "is_allowed": true, "time_to_reset": 0 }));
        }

        let (_, body) = send!(
            app,
            test::TestRequest::get()
                .uri(&uri)
                .insert_header(("X-Forwarded-For", "198.51.100.20"))
        );
        assert_eq!(body["data"]["is_allowed"], false);
        let reset = body["data"]["time_to_reset"].as_u64().unwrap();
        assert!(reset > 0 && reset <= 60);

        // The budget is shared with generation for the same address
        let (status, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/otp/generate")
                .insert_header(("X-Forwarded-For", "198.51.100.20"))
                .set_json(json!({ "phone_number": PHONE }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "RATE_LIMIT_EXCEEDED");
    }

    #[actix_rt::test]
    async fn test_health_and_not_found() {
        let app = test::init_service(create_app(state(10, 100))).await;

        let (status, body) = send!(app, test::TestRequest::get().uri("/health"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send!(app, test::TestRequest::get().uri("/nope"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }
}
