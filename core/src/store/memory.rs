//! Process-local implementation of [`KeyValueStore`]
//!
//! Used for development (`STORE_BACKEND=memory`) and throughout the test
//! suites. Deadlines are measured on `tokio::time::Instant`, so tests can
//! pause the runtime clock and advance it past a TTL. Expired keys are
//! treated as absent and purged lazily on access.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::time::{Duration, Instant};

use super::{KeyValueStore, StoreCommand, StoreError, StoreResult};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |deadline| deadline <= now)
    }
}

/// In-memory key-value store with TTL support
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .map(|entries| entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    /// Whether the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

/// Drop the key if its deadline has passed, then return the live entry
fn live<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
    now: Instant,
) -> Option<&'a mut Entry> {
    if entries.get(key).map_or(false, |e| e.is_expired(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

/// Resolve an inclusive Redis-style range against a list length
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len || stop < 0 {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

/// Apply one batch command against a staged copy of the affected entries
fn apply_command(
    staged: &mut HashMap<String, Option<Entry>>,
    command: &StoreCommand,
    now: Instant,
) -> StoreResult<()> {
    let slot = staged.entry(command.key().to_string()).or_insert(None);
    match command {
        StoreCommand::ListPush { key, value } => {
            let entry = slot.get_or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
            match &mut entry.value {
                Value::List(list) => list.push_front(value.clone()),
                _ => return Err(wrong_type(key)),
            }
        }
        StoreCommand::ListTrim { key, start, stop } => {
            if let Some(entry) = slot.as_mut() {
                let Value::List(list) = &mut entry.value else {
                    return Err(wrong_type(key));
                };
                match resolve_range(list.len(), *start, *stop) {
                    Some((from, to)) => {
                        list.truncate(to + 1);
                        list.drain(..from);
                    }
                    None => list.clear(),
                }
                if list.is_empty() {
                    *slot = None;
                }
            }
        }
        StoreCommand::Expire { seconds, .. } => {
            if *seconds == 0 {
                *slot = None;
            } else if let Some(entry) = slot.as_mut() {
                entry.expires_at = Some(now + Duration::from_secs(*seconds));
            }
        }
        StoreCommand::Delete { .. } => *slot = None,
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        match live(&mut entries, key, now) {
            Some(entry) => {
                let Value::Str(raw) = &mut entry.value else {
                    return Err(wrong_type(key));
                };
                let current: i64 = raw.parse().map_err(|_| StoreError::Corrupt {
                    key: key.to_string(),
                    message: "value is not an integer".to_string(),
                })?;
                let next = current + 1;
                *raw = next.to_string();
                Ok(next)
            }
            None => {
                entries.insert(key.to_string(), Entry::new(Value::Str("1".to_string())));
                Ok(1)
            }
        }
    }

    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        if live(&mut entries, key, now).is_none() {
            return Ok(false);
        }
        if seconds == 0 {
            entries.remove(key);
        } else if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(now + Duration::from_secs(seconds));
        }
        Ok(true)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<i64>> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        Ok(live(&mut entries, key, now)
            .and_then(|entry| entry.expires_at)
            .map(|deadline| {
                let remaining = deadline.saturating_duration_since(now).as_millis() as i64;
                (remaining + 999) / 1000
            }))
    }

    async fn set_with_expiry(&self, key: &str, value: &str, seconds: u64) -> StoreResult<()> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: Some(now + Duration::from_secs(seconds)),
            },
        );
        Ok(())
    }

    async fn hash_get(&self, key: &str, fields: &[&str]) -> StoreResult<Vec<Option<String>>> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        match live(&mut entries, key, now) {
            Some(Entry {
                value: Value::Hash(hash),
                ..
            }) => Ok(fields.iter().map(|f| hash.get(*f).cloned()).collect()),
            Some(_) => Err(wrong_type(key)),
            None => Ok(vec![None; fields.len()]),
        }
    }

    async fn hash_create_if_absent(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl_seconds: u64,
    ) -> StoreResult<bool> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        if live(&mut entries, key, now).is_some() {
            return Ok(false);
        }
        let hash = fields
            .iter()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect();
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Hash(hash),
                expires_at: Some(now + Duration::from_secs(ttl_seconds)),
            },
        );
        Ok(true)
    }

    async fn hash_incr(&self, key: &str, field: &str, delta: i64) -> StoreResult<Option<i64>> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let hash = match live(&mut entries, key, now) {
            Some(Entry {
                value: Value::Hash(hash),
                ..
            }) => hash,
            Some(_) => return Err(wrong_type(key)),
            None => return Ok(None),
        };
        let current: i64 = match hash.get(field) {
            Some(raw) => raw.parse().map_err(|_| StoreError::Corrupt {
                key: key.to_string(),
                message: format!("field '{}' is not an integer", field),
            })?,
            None => 0,
        };
        let next = current + delta;
        hash.insert(field.to_string(), next.to_string());
        Ok(Some(next))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let existed = live(&mut entries, key, now).is_some();
        entries.remove(key);
        Ok(existed)
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        match live(&mut entries, key, now) {
            Some(Entry {
                value: Value::List(list),
                ..
            }) => Ok(match resolve_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(_) => Err(wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn exec_atomic(&self, commands: Vec<StoreCommand>) -> StoreResult<()> {
        let now = Instant::now();
        let mut entries = self.lock()?;

        let mut staged: HashMap<String, Option<Entry>> = HashMap::new();
        for command in &commands {
            let key = command.key();
            if !staged.contains_key(key) {
                let current = live(&mut entries, key, now).cloned();
                staged.insert(key.to_string(), current);
            }
        }
        for command in &commands {
            apply_command(&mut staged, command, now)?;
        }

        for (key, entry) in staged {
            match entry {
                Some(entry) => {
                    entries.insert(key, entry);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<bool> {
        self.lock().map(|_| true)
    }
}
