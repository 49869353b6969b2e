use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::Cache;
use crate::error::Error;

/// Process-local cache with per-entry expiry.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, (String, Instant)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.read().await;

        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => {
                tracing::debug!("cache hit: {}", key);
                Ok(Some(value.clone()))
            }
            _ => {
                tracing::debug!("cache miss: {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value, now + ttl));

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries.write().await.remove(key);

        Ok(())
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<(), Error> {
        let prefix = pattern.trim_end_matches('*');

        self.entries
            .write()
            .await
            .retain(|key, _| !key.starts_with(prefix));

        Ok(())
    }
}

#[tokio::test]
async fn pattern_removal_only_touches_matching_keys() {
    let cache = MemoryCache::new();
    let ttl = Duration::from_secs(60);

    cache.set("ride:list", "[]".into(), ttl).await.unwrap();
    cache
        .set("ride:list:active:driver:1", "[]".into(), ttl)
        .await
        .unwrap();
    cache.set("ride:1", "{}".into(), ttl).await.unwrap();

    cache.remove_by_pattern("ride:list*").await.unwrap();

    assert!(cache.get("ride:list").await.unwrap().is_none());
    assert!(cache.get("ride:list:active:driver:1").await.unwrap().is_none());
    assert_eq!(cache.get("ride:1").await.unwrap(), Some("{}".to_string()));
}

#[tokio::test(start_paused = true)]
async fn entries_expire() {
    let cache = MemoryCache::new();

    cache
        .set("driver:1", "{}".into(), Duration::from_secs(5))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(6)).await;

    assert!(cache.get("driver:1").await.unwrap().is_none());
}
