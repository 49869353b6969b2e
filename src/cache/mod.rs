//! Read-path cache port.
//!
//! The engine memoizes read queries here. After a commit, the entity it
//! mutated is written through under its own key and list keys are dropped.
//! A read that loaded from the store before that commit can still put the
//! older value back; the TTL bounds how long it survives. Nothing reads the
//! cache to make a decision, and failures are logged and the engine falls
//! back to the store.

pub mod keys;
mod memory;
mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), Error>;

    async fn remove(&self, key: &str) -> Result<(), Error>;

    /// `pattern` is a key prefix terminated by `*`, e.g. `ride:list*`.
    async fn remove_by_pattern(&self, pattern: &str) -> Result<(), Error>;
}

/// Cache that never stores anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

#[async_trait]
impl Cache for NoCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), Error> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn remove_by_pattern(&self, _pattern: &str) -> Result<(), Error> {
        Ok(())
    }
}
