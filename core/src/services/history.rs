//! Recency list of issued codes per identity, used to avoid reissuing them

use chrono::Utc;
use og_shared::{phone::mask_phone_number, HistoryConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::store::{KeyValueStore, StoreCommand, StoreError, StoreResult};

/// Store key of the history list for an identity
pub fn history_key(identity: &str) -> String {
    format!("otp:history:{}", identity)
}

/// One issued code, serialized as JSON inside the history list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub otp: String,
    /// Issue time in epoch milliseconds, kept as a string
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn now(otp: &str) -> Self {
        Self {
            otp: otp.to_string(),
            timestamp: Utc::now().timestamp_millis().to_string(),
        }
    }
}

pub struct HistoryTracker {
    store: Arc<dyn KeyValueStore>,
    config: HistoryConfig,
}

impl HistoryTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, config: HistoryConfig) -> Self {
        Self { store, config }
    }

    /// Push the code to the front, trim to the maximum size and refresh the TTL in one batch
    pub async fn record(&self, identity: &str, code: &str) -> StoreResult<()> {
        let key = history_key(identity);
        let value = serde_json::to_string(&HistoryEntry::now(code)).map_err(|e| {
            StoreError::Corrupt {
                key: key.clone(),
                message: e.to_string(),
            }
        })?;
        let stop = self.config.max_size.max(1) as isize - 1;

        self.store
            .exec_atomic(vec![
                StoreCommand::ListPush {
                    key: key.clone(),
                    value,
                },
                StoreCommand::ListTrim {
                    key: key.clone(),
                    start: 0,
                    stop,
                },
                StoreCommand::Expire {
                    key,
                    seconds: self.config.retention_seconds(),
                },
            ])
            .await
    }

    /// Whether `code` is among the retained recent codes
    ///
    /// A missing list or a store error counts as "not used".
    pub async fn was_recently_used(&self, identity: &str, code: &str) -> bool {
        let entries = match self.store.list_range(&history_key(identity), 0, -1).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    phone = %mask_phone_number(identity),
                    error = %e,
                    event = "history_lookup_fail_open",
                    "History lookup failed, treating code as unused"
                );
                return false;
            }
        };

        entries.iter().any(|raw| {
            serde_json::from_str::<HistoryEntry>(raw)
                .map(|entry| entry.otp == code)
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use tokio::time::Duration;

    fn tracker(max_size: u32, retention_days: u64) -> HistoryTracker {
        HistoryTracker::new(
            Arc::new(InMemoryStore::new()),
            HistoryConfig {
                max_size,
                retention_days,
            },
        )
    }

    #[tokio::test]
    async fn test_record_and_lookup() {
        let tracker = tracker(10, 7);
        assert!(!tracker.was_recently_used("id", "1234").await);

        tracker.record("id", "1234").await.unwrap();
        assert!(tracker.was_recently_used("id", "1234").await);
        assert!(!tracker.was_recently_used("id", "4321").await);
        assert!(!tracker.was_recently_used("other", "1234").await);
    }

    #[tokio::test]
    async fn test_list_is_bounded_newest_first() {
        let tracker = tracker(3, 7);
        for code in ["1000", "2000", "3000", "4000"] {
            tracker.record("id", code).await.unwrap();
        }

        let codes: Vec<String> = tracker
            .store
            .list_range(&history_key("id"), 0, -1)
            .await
            .unwrap()
            .iter()
            .map(|raw| serde_json::from_str::<HistoryEntry>(raw).unwrap().otp)
            .collect();
        assert_eq!(codes, vec!["4000", "3000", "2000"]);
        assert!(!tracker.was_recently_used("id", "1000").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_expires_after_retention() {
        let tracker = tracker(10, 1);
        tracker.record("id", "5555").await.unwrap();

        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert!(!tracker.was_recently_used("id", "5555").await);
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = HistoryEntry {
            otp: "1234".to_string(),
            timestamp: "1700000000000".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"otp":"1234","timestamp":"1700000000000"}"#
        );
    }
}
