//! In-memory [`CacheMedium`] implementation for tests and single-process
//! deployments.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Expired entries behave as
//! absent and are dropped lazily on access.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;

use super::CacheMedium;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory cache medium with per-entry expiry.
pub struct MemoryMedium {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryMedium {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheMedium for MemoryMedium {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let expired = {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => true,
            }
        };
        if expired {
            self.entries.write().unwrap().remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let medium = MemoryMedium::new();
        medium
            .set_with_ttl("search:a", "payload", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            medium.get("search:a").await.unwrap(),
            Some("payload".to_string())
        );
    }

    #[tokio::test]
    async fn expired_entry_is_absent() {
        let medium = MemoryMedium::new();
        medium
            .set_with_ttl("search:a", "payload", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(medium.get("search:a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_prefix_only_removes_matching_keys() {
        let medium = MemoryMedium::new();
        let ttl = Duration::from_secs(60);
        medium.set_with_ttl("search:a", "1", ttl).await.unwrap();
        medium.set_with_ttl("search:b", "2", ttl).await.unwrap();
        medium.set_with_ttl("autocomplete:a", "3", ttl).await.unwrap();

        let dropped = medium.delete_prefix("search:").await.unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(medium.get("search:a").await.unwrap(), None);
        assert_eq!(
            medium.get("autocomplete:a").await.unwrap(),
            Some("3".to_string())
        );
    }
}
