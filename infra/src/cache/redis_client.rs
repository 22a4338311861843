//! Redis cache client implementation
//!
//! This module provides the Redis client behind the OTP services: a single
//! multiplexed async connection established with retry logic, and the
//! [`KeyValueStore`] operations (counters, TTL keys, hashes, bounded lists
//! and MULTI/EXEC batches) mapped onto Redis commands. Every key passes
//! through [`CacheConfig::make_key`] so a deployment prefix namespaces the
//! whole keyspace.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client, RedisError, Script};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use og_core::{KeyValueStore, StoreCommand, StoreError, StoreResult};

use crate::cache::CacheConfig;
use crate::InfrastructureError;

/// Create the hash only when the key is absent. ARGV[1] is the TTL, then field/value pairs.
const CREATE_IF_ABSENT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV, 2))
redis.call('EXPIRE', KEYS[1], ARGV[1])
return 1
"#;

/// HINCRBY that never creates the key
const INCR_EXISTING_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end
return redis.call('HINCRBY', KEYS[1], ARGV[1], ARGV[2])
"#;

/// Redis store client
///
/// Holds one multiplexed connection; clones of the connection share the
/// underlying socket, so the client is cheap to use from many tasks.
pub struct RedisClient {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Configuration used to create this client
    config: CacheConfig,
    create_if_absent: Script,
    incr_existing: Script,
}

impl RedisClient {
    /// Connect using the retry settings from `config`
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        let retries = config.connect_retries.max(1);
        let delay = config.retry_delay_ms;
        Self::new_with_retry_config(config, retries, delay).await
    }

    /// Connect with explicit retry settings
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    /// * `max_retries` - Maximum number of connection attempts
    /// * `retry_delay_ms` - Base delay between attempts in milliseconds
    pub async fn new_with_retry_config(
        config: CacheConfig,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, InfrastructureError> {
        info!("Creating Redis client with URL: {}", mask_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection =
            Self::create_connection_with_retry(client, max_retries, retry_delay_ms).await?;

        info!("Redis client created successfully");

        Ok(Self {
            connection,
            config,
            create_if_absent: Script::new(CREATE_IF_ABSENT_SCRIPT),
            incr_existing: Script::new(INCR_EXISTING_SCRIPT),
        })
    }

    /// Create multiplexed connection with retry logic
    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            match client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    // Exponential backoff with cap at 5 seconds
                    delay = (delay * 2).min(5000);
                }
                Err(e) => {
                    error!(
                        "Failed to connect to Redis after {} attempts: {}",
                        attempts, e
                    );
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn key(&self, key: &str) -> String {
        self.config.make_key(key)
    }

    fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

/// Translate a Redis error, logging the failed command
fn store_error(command: &'static str, key: &str, err: RedisError) -> StoreError {
    error!(command = command, error = %err, "Redis command failed");
    if err.code() == Some("WRONGTYPE") {
        StoreError::WrongType {
            key: key.to_string(),
        }
    } else {
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl KeyValueStore for RedisClient {
    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let key = self.key(key);
        redis::cmd("INCR")
            .arg(&key)
            .query_async::<_, i64>(&mut self.connection())
            .await
            .map_err(|e| store_error("INCR", &key, e))
    }

    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool> {
        let key = self.key(key);
        redis::cmd("EXPIRE")
            .arg(&key)
            .arg(seconds)
            .query_async::<_, bool>(&mut self.connection())
            .await
            .map_err(|e| store_error("EXPIRE", &key, e))
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<i64>> {
        let key = self.key(key);
        let ttl = redis::cmd("TTL")
            .arg(&key)
            .query_async::<_, i64>(&mut self.connection())
            .await
            .map_err(|e| store_error("TTL", &key, e))?;

        // -1: no expiry, -2: missing key
        Ok((ttl >= 0).then_some(ttl))
    }

    async fn set_with_expiry(&self, key: &str, value: &str, seconds: u64) -> StoreResult<()> {
        let key = self.key(key);
        redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async::<_, ()>(&mut self.connection())
            .await
            .map_err(|e| store_error("SET", &key, e))
    }

    async fn hash_get(&self, key: &str, fields: &[&str]) -> StoreResult<Vec<Option<String>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let key = self.key(key);
        redis::cmd("HMGET")
            .arg(&key)
            .arg(fields)
            .query_async::<_, Vec<Option<String>>>(&mut self.connection())
            .await
            .map_err(|e| store_error("HMGET", &key, e))
    }

    async fn hash_create_if_absent(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl_seconds: u64,
    ) -> StoreResult<bool> {
        let key = self.key(key);
        let mut invocation = self.create_if_absent.key(&key);
        invocation.arg(ttl_seconds);
        for (field, value) in fields {
            invocation.arg(*field).arg(value);
        }

        let created = invocation
            .invoke_async::<_, i64>(&mut self.connection())
            .await
            .map_err(|e| store_error("EVALSHA", &key, e))?;
        Ok(created == 1)
    }

    async fn hash_incr(&self, key: &str, field: &str, delta: i64) -> StoreResult<Option<i64>> {
        let key = self.key(key);
        self.incr_existing
            .key(&key)
            .arg(field)
            .arg(delta)
            .invoke_async::<_, Option<i64>>(&mut self.connection())
            .await
            .map_err(|e| store_error("EVALSHA", &key, e))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let key = self.key(key);
        let removed = redis::cmd("DEL")
            .arg(&key)
            .query_async::<_, u32>(&mut self.connection())
            .await
            .map_err(|e| store_error("DEL", &key, e))?;
        Ok(removed > 0)
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let key = self.key(key);
        redis::cmd("LRANGE")
            .arg(&key)
            .arg(start)
            .arg(stop)
            .query_async::<_, Vec<String>>(&mut self.connection())
            .await
            .map_err(|e| store_error("LRANGE", &key, e))
    }

    async fn exec_atomic(&self, commands: Vec<StoreCommand>) -> StoreResult<()> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in &commands {
            let key = self.key(command.key());
            match command {
                StoreCommand::ListPush { value, .. } => {
                    pipe.cmd("LPUSH").arg(&key).arg(value).ignore();
                }
                StoreCommand::ListTrim { start, stop, .. } => {
                    pipe.cmd("LTRIM").arg(&key).arg(*start).arg(*stop).ignore();
                }
                StoreCommand::Expire { seconds, .. } => {
                    pipe.cmd("EXPIRE").arg(&key).arg(*seconds).ignore();
                }
                StoreCommand::Delete { .. } => {
                    pipe.cmd("DEL").arg(&key).ignore();
                }
            }
        }

        let first_key = commands[0].key().to_string();
        pipe.query_async::<_, ()>(&mut self.connection())
            .await
            .map_err(|e| store_error("EXEC", &first_key, e))
    }

    async fn ping(&self) -> StoreResult<bool> {
        let response = redis::cmd("PING")
            .query_async::<_, String>(&mut self.connection())
            .await
            .map_err(|e| store_error("PING", "", e))?;

        if response == "PONG" {
            debug!("Redis health check passed");
            Ok(true)
        } else {
            warn!("Redis health check returned unexpected response: {}", response);
            Ok(false)
        }
    }
}

/// Mask sensitive parts of Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let host_part = &url[at_pos..];
            return format!("{}****{}", proto, host_part);
        }
    }
    url.to_string()
}
