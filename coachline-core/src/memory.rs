use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::repository::{DocumentStore, StoreResult};

/// In-memory document store for development and tests
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<String, Value>>,
    claims: Mutex<HashMap<String, String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            claims: Mutex::new(HashMap::new()),
        }
    }

    /// Number of documents currently stored (all collections).
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current holder of a claim key.
    pub async fn claim_owner(&self, key: &str) -> Option<String> {
        self.claims.lock().await.get(key).cloned()
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        Ok(self.documents.read().await.get(path).cloned())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let prefix = format!("{}/", collection.trim_end_matches('/'));
        let documents = self.documents.read().await;

        Ok(documents
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn set(&self, path: &str, doc: Value) -> StoreResult<()> {
        if path.is_empty() || path.ends_with('/') {
            return Err(format!("Invalid document path: '{}'", path).into());
        }
        self.documents.write().await.insert(path.to_string(), doc);
        Ok(())
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        self.documents.write().await.remove(path);
        Ok(())
    }

    async fn claim(&self, key: &str, owner: &str) -> StoreResult<bool> {
        let mut claims = self.claims.lock().await;
        match claims.get(key) {
            Some(current) => Ok(current == owner),
            None => {
                claims.insert(key.to_string(), owner.to_string());
                Ok(true)
            }
        }
    }

    async fn release(&self, key: &str, owner: &str) -> StoreResult<()> {
        let mut claims = self.claims.lock().await;
        if claims.get(key).map(String::as_str) == Some(owner) {
            claims.remove(key);
        }
        Ok(())
    }
}
