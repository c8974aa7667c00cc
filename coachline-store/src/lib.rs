pub mod app_config;
pub mod redis_repo;

use std::sync::Arc;

use coachline_core::{DocumentStore, MemoryDocumentStore, StoreResult};

pub use app_config::{Config, StoreBackend, StoreConfig};
pub use redis_repo::RedisDocumentStore;

/// Opens the document store selected by `store.backend`.
pub async fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        StoreBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or("store.redis_url is required for the redis backend")?;
            let store = RedisDocumentStore::new(url).await?;
            tracing::info!("Connected to redis document store");
            Ok(Arc::new(store))
        }
    }
}
