//! Main OTP lifecycle implementation

use chrono::Utc;
use og_shared::{phone::mask_phone_number, BlockConfig, OtpConfig, RateLimitConfig};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::errors::{OtpError, OtpResult};
use crate::services::block::BlockGuard;
use crate::services::history::HistoryTracker;
use crate::services::rate_limit::{RateLimitDecision, RateLimiter};
use crate::store::{KeyValueStore, StoreError};

use super::generator::{CodeGenerator, RandomCodeGenerator, MAX_DIGITS};
use super::side_effects::{SideEffectKind, SideEffectSink, SideEffects};
use super::types::{OtpStatus, VerifyOutcome};

const FIELD_OTP: &str = "otp";
const FIELD_ATTEMPTS: &str = "attempts";
const FIELD_CREATED_AT: &str = "created_at";

/// Store key of the active OTP record for an identity
pub fn otp_key(identity: &str) -> String {
    format!("otp:{}", identity)
}

/// Issues and verifies one-time passcodes
///
/// All state lives in the injected store; the service itself holds no
/// per-identity data, so any number of instances may share one store.
pub struct OtpService {
    store: Arc<dyn KeyValueStore>,
    config: OtpConfig,
    rate_limiter: RateLimiter,
    block_guard: Arc<BlockGuard>,
    history: Arc<HistoryTracker>,
    generator: Arc<dyn CodeGenerator>,
    side_effects: SideEffects,
}

impl OtpService {
    /// Create a new OTP service
    ///
    /// # Arguments
    ///
    /// * `store` - Shared key-value store
    /// * `config` - Code length, expiry, attempt and history settings
    /// * `rate_limit` - Per-address request window
    /// * `block` - Lockout duration after attempt exhaustion
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        config: OtpConfig,
        rate_limit: RateLimitConfig,
        block: BlockConfig,
    ) -> Self {
        Self {
            rate_limiter: RateLimiter::new(store.clone(), rate_limit),
            block_guard: Arc::new(BlockGuard::new(store.clone(), block)),
            history: Arc::new(HistoryTracker::new(store.clone(), config.history.clone())),
            generator: Arc::new(RandomCodeGenerator),
            side_effects: SideEffects::default(),
            store,
            config,
        }
    }

    /// Replace the code generator
    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Replace the sink receiving background failures
    pub fn with_sink(mut self, sink: Arc<dyn SideEffectSink>) -> Self {
        self.side_effects.set_sink(sink);
        self
    }

    /// Run background effects on `runtime` instead of the caller's runtime
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.side_effects = self.side_effects.with_runtime(runtime);
        self
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    pub fn side_effects(&self) -> &SideEffects {
        &self.side_effects
    }

    /// Wait for outstanding history appends and blocks
    pub async fn drain(&self) {
        self.side_effects.drain().await;
    }

    /// Issue a new code of `digits` digits to `identity`
    ///
    /// # Errors
    ///
    /// * `Validation` - empty identity or digit count outside `1..=18`
    /// * `Throttled` / `Blocked` - a gate rejected the request
    /// * `Conflict` - an active code already exists for the identity
    /// * `CodeSpaceExhausted` - every candidate was found in the history
    pub async fn issue(&self, identity: &str, address: &str, digits: u32) -> OtpResult<String> {
        if identity.trim().is_empty() {
            return Err(OtpError::validation("phone_number"));
        }
        if !(1..=MAX_DIGITS).contains(&digits) {
            return Err(OtpError::invalid_field(
                "digits",
                format!("digits must be between 1 and {}", MAX_DIGITS),
            ));
        }
        let masked = mask_phone_number(identity);

        self.enforce_rate_limit(address).await?;
        self.enforce_not_blocked(identity).await?;

        let code = self.generate_unused(identity, digits).await?;

        let created_at = Utc::now().timestamp_millis().to_string();
        let fields = [
            (FIELD_OTP, code.clone()),
            (FIELD_ATTEMPTS, "0".to_string()),
            (FIELD_CREATED_AT, created_at),
        ];
        let created = self
            .store
            .hash_create_if_absent(&otp_key(identity), &fields, self.config.expiry_seconds)
            .await?;
        if !created {
            debug!(phone = %masked, event = "otp_conflict", "Active OTP already exists");
            return Err(OtpError::Conflict);
        }

        let history = self.history.clone();
        let (owner, issued) = (identity.to_string(), code.clone());
        self.side_effects
            .spawn(SideEffectKind::HistoryAppend, identity, async move {
                history.record(&owner, &issued).await
            });

        info!(
            phone = %masked,
            ip = %address,
            expires_in = self.config.expiry_seconds,
            event = "otp_issued",
            "OTP issued"
        );
        Ok(code)
    }

    /// Check `candidate` against the active code for `identity`
    ///
    /// Gate rejections and a missing record are errors; the three terminal
    /// outcomes are returned as [`VerifyOutcome`].
    pub async fn verify(
        &self,
        identity: &str,
        candidate: &str,
        address: &str,
    ) -> OtpResult<VerifyOutcome> {
        if identity.trim().is_empty() {
            return Err(OtpError::validation("phone_number"));
        }
        if candidate.is_empty() {
            return Err(OtpError::validation("otp"));
        }
        let masked = mask_phone_number(identity);

        self.enforce_rate_limit(address).await?;
        self.enforce_not_blocked(identity).await?;

        let key = otp_key(identity);
        let values = self
            .store
            .hash_get(&key, &[FIELD_OTP, FIELD_ATTEMPTS, FIELD_CREATED_AT])
            .await?;
        let mut values = values.into_iter();
        let (stored, attempts, created_at) = (
            values.next().flatten(),
            values.next().flatten(),
            values.next().flatten(),
        );

        let Some(stored) = stored else {
            return Err(OtpError::NotFoundOrExpired);
        };
        let attempts = parse_field(&key, FIELD_ATTEMPTS, attempts.as_deref())?.unwrap_or(0);
        let created_at = parse_field(&key, FIELD_CREATED_AT, created_at.as_deref())?;

        // The store TTL and the application clock may disagree; either one expires the code
        let elapsed = created_at.map(|created| Utc::now().timestamp_millis() - created);
        if elapsed.map_or(false, |ms| ms > self.config.expiry_millis()) {
            self.store.delete(&key).await?;
            debug!(phone = %masked, event = "otp_expired", "OTP expired by elapsed time");
            return Err(OtpError::NotFoundOrExpired);
        }

        let max_attempts = i64::from(self.config.max_attempts);
        if attempts >= max_attempts {
            return self.lock_out(identity, &key).await;
        }

        if candidate == stored {
            // A concurrent verification may have consumed the record first
            if !self.store.delete(&key).await? {
                return Err(OtpError::NotFoundOrExpired);
            }
            info!(phone = %masked, ip = %address, event = "otp_verified", "OTP verified");
            return Ok(VerifyOutcome::Success);
        }

        let Some(attempts) = self.store.hash_incr(&key, FIELD_ATTEMPTS, 1).await? else {
            return Err(OtpError::NotFoundOrExpired);
        };
        if attempts >= max_attempts {
            return self.lock_out(identity, &key).await;
        }

        warn!(
            phone = %masked,
            ip = %address,
            attempts = attempts,
            remaining_attempts = max_attempts - attempts,
            event = "otp_invalid",
            "Invalid OTP submitted"
        );
        Ok(VerifyOutcome::Invalid)
    }

    /// Attempt count of the active record, if any
    pub async fn status(&self, identity: &str) -> OtpResult<Option<OtpStatus>> {
        if identity.trim().is_empty() {
            return Err(OtpError::validation("phone_number"));
        }
        let key = otp_key(identity);
        let values = self
            .store
            .hash_get(&key, &[FIELD_OTP, FIELD_ATTEMPTS])
            .await?;
        let mut values = values.into_iter();
        let (stored, attempts) = (values.next().flatten(), values.next().flatten());

        if stored.is_none() {
            return Ok(None);
        }
        let attempts = parse_field(&key, FIELD_ATTEMPTS, attempts.as_deref())?.unwrap_or(0);
        Ok(Some(OtpStatus {
            attempts: u32::try_from(attempts).unwrap_or(0),
        }))
    }

    /// Run the address through the rate limiter, consuming one request
    pub async fn check_rate_limit(&self, address: &str) -> RateLimitDecision {
        self.rate_limiter.check(address).await
    }

    async fn enforce_rate_limit(&self, address: &str) -> OtpResult<()> {
        let decision = self.rate_limiter.check(address).await;
        if decision.allowed {
            return Ok(());
        }
        Err(OtpError::Throttled {
            retry_after_seconds: decision
                .retry_after_seconds
                .unwrap_or(self.rate_limiter.config().window_seconds),
        })
    }

    async fn enforce_not_blocked(&self, identity: &str) -> OtpResult<()> {
        let status = self.block_guard.is_blocked(identity).await?;
        if !status.blocked {
            return Ok(());
        }
        debug!(
            phone = %mask_phone_number(identity),
            retry_after = status.retry_after_seconds,
            event = "user_blocked",
            "Blocked identity rejected"
        );
        Err(OtpError::Blocked {
            retry_after_seconds: status.retry_after_seconds.unwrap_or(0),
        })
    }

    /// Generate candidates until one is absent from the history
    async fn generate_unused(&self, identity: &str, digits: u32) -> OtpResult<String> {
        let mut code = self.generator.generate(digits);
        let mut regenerations = 0;

        while self.history.was_recently_used(identity, &code).await {
            if regenerations >= self.config.max_regenerations {
                warn!(
                    phone = %mask_phone_number(identity),
                    digits = digits,
                    event = "otp_code_space_exhausted",
                    "No unused code found"
                );
                return Err(OtpError::CodeSpaceExhausted {
                    attempts: regenerations + 1,
                });
            }
            regenerations += 1;
            code = self.generator.generate(digits);
        }

        if regenerations > 0 {
            debug!(
                phone = %mask_phone_number(identity),
                regenerations = regenerations,
                "Regenerated OTP to avoid reuse"
            );
        }
        Ok(code)
    }

    async fn lock_out(&self, identity: &str, key: &str) -> OtpResult<VerifyOutcome> {
        self.store.delete(key).await?;

        let guard = self.block_guard.clone();
        let owner = identity.to_string();
        self.side_effects
            .spawn(SideEffectKind::Block, identity, async move {
                guard.block(&owner).await
            });

        warn!(
            phone = %mask_phone_number(identity),
            event = "otp_locked_out",
            "Maximum OTP attempts reached, blocking identity"
        );
        Ok(VerifyOutcome::LockedOut)
    }
}

fn parse_field(key: &str, field: &str, raw: Option<&str>) -> Result<Option<i64>, StoreError> {
    raw.map(|value| {
        value.parse::<i64>().map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            message: format!("field '{}' is not an integer", field),
        })
    })
    .transpose()
}
