mod driver_api;
mod helpers;
mod passenger_api;
mod ride_api;
mod ride_request_api;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    api::API,
    cache::Cache,
    config::Config,
    db::Store,
    error::{timeout_error, Error},
};

/// Lifecycle engine. Every mutation is one unit of work against the store,
/// bounded by the configured operation timeout; reads go through the cache.
pub struct Engine<S> {
    store: S,
    cache: Arc<dyn Cache>,
    operation_timeout: Duration,
    cache_ttl: Duration,
}

impl<S: Store> Engine<S> {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(store: S, cache: Arc<dyn Cache>, config: &Config) -> Self {
        tracing::info!(
            "operation timeout {:?}, cache ttl {:?}",
            config.operation_timeout,
            config.cache_ttl
        );

        Self {
            store,
            cache,
            operation_timeout: config.operation_timeout,
            cache_ttl: config.cache_ttl,
        }
    }

    /// Runs `operation` under the deadline. On expiry the future is dropped,
    /// which drops any open unit of work and rolls it back.
    async fn within_deadline<T, F>(&self, operation: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>> + Send,
    {
        match tokio::time::timeout(self.operation_timeout, operation).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("deadline of {:?} exceeded", self.operation_timeout);
                Err(timeout_error())
            }
        }
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!("cache read for {} failed: {}", key, err);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("dropping undecodable cache entry {}: {}", key, err);
                self.forget(&[key.to_string()], &[]).await;
                None
            }
        }
    }

    async fn remember<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("could not encode {} for the cache: {}", key, err);
                return;
            }
        };

        if let Err(err) = self.cache.set(key, raw, self.cache_ttl).await {
            tracing::warn!("cache write for {} failed: {}", key, err);
        }
    }

    /// Removes entity keys and every key under the list patterns.
    async fn forget(&self, keys: &[String], patterns: &[&str]) {
        for key in keys {
            if let Err(err) = self.cache.remove(key).await {
                tracing::warn!("cache removal of {} failed: {}", key, err);
            }
        }

        for pattern in patterns {
            if let Err(err) = self.cache.remove_by_pattern(pattern).await {
                tracing::warn!("cache invalidation of {} failed: {}", pattern, err);
            }
        }
    }
}

impl<S: Store> API for Engine<S> {}
