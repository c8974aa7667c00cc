use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::CoreResult;

pub type StoreResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Hierarchical JSON document store keyed by slash-separated paths
/// (`users/{uid}/travels/{tid}/orders/{oid}`).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document.
    async fn get(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Direct children of a collection path; nested sub-collections are not included.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Value>>;

    /// Create or replace a document.
    async fn set(&self, path: &str, doc: Value) -> StoreResult<()>;

    async fn delete(&self, path: &str) -> StoreResult<()>;

    /// Atomically take `key` for `owner` if nobody holds it.
    /// Returns true when the claim was taken or is already held by `owner`.
    async fn claim(&self, key: &str, owner: &str) -> StoreResult<bool>;

    /// Drop the claim on `key` only if `owner` still holds it.
    async fn release(&self, key: &str, owner: &str) -> StoreResult<()>;
}

/// Typed access on top of a [`DocumentStore`].
#[derive(Clone)]
pub struct Documents {
    store: Arc<dyn DocumentStore>,
}

impl Documents {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> CoreResult<Option<T>> {
        tracing::debug!("get {}", path);
        match self.store.get(path).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn list<T: DeserializeOwned>(&self, collection: &str) -> CoreResult<Vec<T>> {
        tracing::debug!("list {}", collection);
        self.store
            .list(collection)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .collect()
    }

    pub async fn put<T: Serialize>(&self, path: &str, doc: &T) -> CoreResult<()> {
        tracing::debug!("set {}", path);
        let value = serde_json::to_value(doc)?;
        self.store.set(path, value).await?;
        Ok(())
    }

    pub async fn remove(&self, path: &str) -> CoreResult<()> {
        tracing::debug!("delete {}", path);
        self.store.delete(path).await?;
        Ok(())
    }

    pub async fn claim(&self, key: &str, owner: &str) -> CoreResult<bool> {
        Ok(self.store.claim(key, owner).await?)
    }

    pub async fn release(&self, key: &str, owner: &str) -> CoreResult<()> {
        self.store.release(key, owner).await?;
        Ok(())
    }
}
