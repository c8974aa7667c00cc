use async_trait::async_trait;
use coachline_core::{DocumentStore, StoreResult};
use redis::AsyncCommands;
use serde_json::Value;
use tracing::{debug, info};

const DOC_PREFIX: &str = "doc:";
const COLLECTION_PREFIX: &str = "col:";
const CLAIM_PREFIX: &str = "claim:";

/// Document store on redis: one JSON string per document and one set of
/// member paths per collection.
#[derive(Clone)]
pub struct RedisDocumentStore {
    client: redis::Client,
}

impl RedisDocumentStore {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        // Fail fast on a bad URL or unreachable server
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        info!("Redis document store ready");
        Ok(Self { client })
    }

    async fn conn(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

fn doc_key(path: &str) -> String {
    format!("{}{}", DOC_PREFIX, path)
}

fn claim_key(key: &str) -> String {
    format!("{}{}", CLAIM_PREFIX, key)
}

/// Set key of the collection a document path belongs to.
fn collection_key(path: &str) -> Option<String> {
    let (parent, id) = path.rsplit_once('/')?;
    if parent.is_empty() || id.is_empty() {
        return None;
    }
    Some(format!("{}{}", COLLECTION_PREFIX, parent))
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(doc_key(path)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let mut conn = self.conn().await?;
        let set = format!("{}{}", COLLECTION_PREFIX, collection.trim_end_matches('/'));
        let mut members: Vec<String> = conn.smembers(&set).await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }
        members.sort();

        let keys: Vec<String> = members.iter().map(|m| doc_key(m)).collect();
        let raw: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;

        let mut docs = Vec::with_capacity(raw.len());
        for json in raw.into_iter().flatten() {
            docs.push(serde_json::from_str(&json)?);
        }
        debug!("Listed {} documents from {}", docs.len(), collection);
        Ok(docs)
    }

    async fn set(&self, path: &str, doc: Value) -> StoreResult<()> {
        let collection = collection_key(path).ok_or_else(|| format!("Invalid document path: '{}'", path))?;
        let json = serde_json::to_string(&doc)?;
        let mut conn = self.conn().await?;

        redis::pipe()
            .atomic()
            .set(doc_key(path), json)
            .ignore()
            .sadd(collection, path)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().del(doc_key(path)).ignore();
        if let Some(collection) = collection_key(path) {
            pipe.srem(collection, path).ignore();
        }
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn claim(&self, key: &str, owner: &str) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let key = claim_key(key);

        // SET NX: only set if key does not exist
        let result: Option<String> = redis::cmd("SET").arg(&key).arg(owner).arg("NX").query_async(&mut conn).await?;
        if result.is_some() {
            return Ok(true);
        }
        let current: Option<String> = conn.get(&key).await?;
        Ok(current.as_deref() == Some(owner))
    }

    async fn release(&self, key: &str, owner: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let script = redis::Script::new(
            r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#,
        );
        let _: i64 = script.key(claim_key(key)).arg(owner).invoke_async(&mut conn).await?;
        Ok(())
    }
}
