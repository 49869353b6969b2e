use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vemquecabe::cache::{Cache, MemoryCache, NoCache, RedisCache};
use vemquecabe::config::{CacheBackend, Config};
use vemquecabe::db::{MemoryStore, PgStore};
use vemquecabe::engine::Engine;
use vemquecabe::error::Error;
use vemquecabe::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let cache: Arc<dyn Cache> = match config.cache_backend {
        CacheBackend::None => Arc::new(NoCache),
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Redis => Arc::new(RedisCache::new(&config.redis_url).await?),
    };

    match &config.database_url {
        Some(url) => {
            let store = PgStore::new(url, config.database_max_connections).await?;
            serve(Engine::new(store, cache, &config), config.listen_addr).await
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, running on the in-memory store");
            serve(Engine::new(MemoryStore::new(), cache, &config), config.listen_addr).await
        }
    }
}
