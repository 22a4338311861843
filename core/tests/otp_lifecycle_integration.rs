//! End-to-end lifecycle scenarios against the in-memory store

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use og_core::services::block::block_key;
    use og_core::services::history::HistoryTracker;
    use og_core::{
        CodeGenerator, InMemoryStore, KeyValueStore, OtpError, OtpService, RateLimiter,
        VerifyOutcome,
    };
    use og_shared::{BlockConfig, HistoryConfig, OtpConfig, RateLimitConfig};

    const PHONE: &str = "+15551234567";
    const IP: &str = "192.0.2.10";

    /// Counts upwards so consecutive codes never repeat
    struct CountingGenerator(std::sync::atomic::AtomicU64);

    impl CodeGenerator for CountingGenerator {
        fn generate(&self, digits: u32) -> String {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            format!("{:0width$}", 10u64.pow(digits - 1) + n, width = digits as usize)
        }
    }

    fn service(store: Arc<InMemoryStore>, max_attempts: u32) -> OtpService {
        OtpService::new(
            store,
            OtpConfig {
                digits: 4,
                max_attempts,
                ..OtpConfig::default()
            },
            RateLimitConfig::new(50, 60),
            BlockConfig {
                duration_seconds: 3600,
            },
        )
    }

    #[tokio::test]
    async fn lockout_scenario_blocks_even_the_correct_code() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(store.clone(), 3);

        let code = service.issue(PHONE, IP, 4).await.unwrap();
        let wrong = if code == "9999" { "1000" } else { "9999" };

        let outcomes = [
            service.verify(PHONE, wrong, IP).await.unwrap(),
            service.verify(PHONE, wrong, IP).await.unwrap(),
            service.verify(PHONE, wrong, IP).await.unwrap(),
        ];
        assert_eq!(
            outcomes,
            [VerifyOutcome::Invalid, VerifyOutcome::Invalid, VerifyOutcome::LockedOut]
        );

        service.drain().await;
        assert_eq!(store.ttl(&block_key(PHONE)).await.unwrap(), Some(3600));

        match service.verify(PHONE, &code, IP).await {
            Err(OtpError::Blocked { retry_after_seconds }) => assert!(retry_after_seconds > 0),
            other => panic!("expected Blocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn single_active_record_per_identity() {
        let service = service(Arc::new(InMemoryStore::new()), 10);

        let code = service.issue(PHONE, IP, 4).await.unwrap();
        assert!(matches!(service.issue(PHONE, IP, 4).await, Err(OtpError::Conflict)));

        assert_eq!(service.verify(PHONE, &code, IP).await.unwrap(), VerifyOutcome::Success);
        assert!(matches!(
            service.verify(PHONE, &code, IP).await,
            Err(OtpError::NotFoundOrExpired)
        ));
        assert!(service.issue(PHONE, IP, 4).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_issuance_yields_one_record() {
        let service = Arc::new(service(Arc::new(InMemoryStore::new()), 10));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move { service.issue(PHONE, IP, 6).await }));
        }

        let mut issued = Vec::new();
        for handle in handles {
            if let Ok(code) = handle.await.unwrap() {
                issued.push(code);
            }
        }
        assert_eq!(issued.len(), 1);
        assert_eq!(
            service.verify(PHONE, &issued[0], IP).await.unwrap(),
            VerifyOutcome::Success
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_window_scenario() {
        let limiter = RateLimiter::new(
            Arc::new(InMemoryStore::new()),
            RateLimitConfig::new(2, 60),
        );

        assert!(limiter.check("A").await.allowed);
        assert!(limiter.check("A").await.allowed);
        let denied = limiter.check("A").await;
        assert!(!denied.allowed);
        let reset = denied.retry_after_seconds.unwrap();
        assert!(reset > 0 && reset <= 60);
    }

    #[tokio::test]
    async fn recent_codes_are_never_reissued() {
        let store = Arc::new(InMemoryStore::new());
        let history = HistoryTracker::new(
            store.clone(),
            HistoryConfig {
                max_size: 10,
                retention_days: 7,
            },
        );
        let service = service(store, 10)
            .with_generator(Arc::new(CountingGenerator(Default::default())));

        // Codes 1000..=1004 are in the history, so issuance must skip past them
        for code in ["1000", "1001", "1002", "1003", "1004"] {
            history.record(PHONE, code).await.unwrap();
        }

        let code = service.issue(PHONE, IP, 4).await.unwrap();
        assert_eq!(code, "1005");
    }
}
