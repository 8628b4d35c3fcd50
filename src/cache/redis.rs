//! Redis-backed [`CacheMedium`] implementation.
//!
//! Uses a multiplexed async connection shared across all operations.
//! Expiry is delegated to Redis via `SET ... EX`; prefix invalidation uses
//! `KEYS <prefix>*` followed by a single `DEL`, which is acceptable at the
//! key volumes a catalog cache produces.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::CacheMedium;

/// Redis cache medium over one multiplexed connection.
pub struct RedisMedium {
    conn: MultiplexedConnection,
}

impl RedisMedium {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .with_context(|| format!("invalid redis url: {}", url))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .with_context(|| format!("failed to connect to redis at {}", url))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheMedium for RedisMedium {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        // Redis expiry has whole-second resolution; never round down to 0.
        let secs = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, secs).await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        // Cache key prefixes contain no glob metacharacters.
        let keys: Vec<String> = conn.keys(format!("{}*", prefix)).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let dropped = keys.len() as u64;
        let _: () = conn.del(keys).await?;
        Ok(dropped)
    }
}
