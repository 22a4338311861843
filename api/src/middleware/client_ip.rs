//! Client address extraction for rate limiting

use actix_web::HttpRequest;

/// Extract client IP address from request
///
/// Order: first entry of `X-Forwarded-For`, then `X-Real-IP`, then the
/// peer address, else `"unknown"`.
pub fn client_ip(req: &HttpRequest) -> String {
    // Try to get IP from X-Forwarded-For header (for reverse proxy scenarios)
    if let Some(forwarded_for) = req.headers().get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded_for.to_str() {
            // Take the first IP from the comma-separated list
            if let Some(ip) = forwarded_str.split(',').map(str::trim).find(|ip| !ip.is_empty()) {
                return ip.to_string();
            }
        }
    }

    // Try to get IP from X-Real-IP header
    if let Some(real_ip) = req.headers().get("X-Real-IP") {
        if let Ok(ip_str) = real_ip.to_str() {
            let ip_str = ip_str.trim();
            if !ip_str.is_empty() {
                return ip_str.to_string();
            }
        }
    }

    // Fall back to connection info
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_forwarded_for_wins() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.5, 10.0.0.1"))
            .insert_header(("X-Real-IP", "198.51.100.2"))
            .to_http_request();
        assert_eq!(client_ip(&req), "203.0.113.5");
    }

    #[test]
    fn test_real_ip_fallback() {
        let req = TestRequest::default()
            .insert_header(("X-Real-IP", "198.51.100.2"))
            .to_http_request();
        assert_eq!(client_ip(&req), "198.51.100.2");
    }

    #[test]
    fn test_peer_addr_fallback() {
        let req = TestRequest::default()
            .peer_addr("192.0.2.44:53211".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req), "192.0.2.44");

        let req = TestRequest::default().to_http_request();
        assert_eq!(client_ip(&req), "unknown");
    }
}
