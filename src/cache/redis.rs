use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};

use super::Cache;
use crate::error::Error;

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    #[tracing::instrument(name = "RedisCache::new", skip(redis_url))]
    pub async fn new(redis_url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        tracing::info!("connected to redis");

        Ok(Self { manager })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.manager.clone();

        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), Error> {
        let mut conn = self.manager.clone();

        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.manager.clone();

        let _: i64 = conn.del(key).await?;

        Ok(())
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<(), Error> {
        let mut conn = self.manager.clone();

        let keys: Vec<String> = conn.keys(pattern).await?;
        if keys.is_empty() {
            return Ok(());
        }

        tracing::debug!("invalidating {} keys matching {}", keys.len(), pattern);

        let _: i64 = conn.del(keys).await?;

        Ok(())
    }
}
