//! Redis-backed document store.
//!
//! Each document is a hash at `{namespace}:{collection}:{id}` with the
//! fields `version`, `data` (JSON) and `updated` (RFC 3339). A set at
//! `{namespace}:{collection}:_ids` indexes the collection. Writes that
//! check or bump the version run as Lua scripts so they are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Script};
use serde_json::Value;
use tracing::debug;

use crate::document::{DocumentStore, StoredDocument};
use crate::error::{StoreError, StoreResult};

const CREATE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('HSET', KEYS[1], 'version', 1, 'data', ARGV[1], 'updated', ARGV[2])
redis.call('SADD', KEYS[2], ARGV[3])
return 1
"#;

const REPLACE_SCRIPT: &str = r#"
local current = redis.call('HGET', KEYS[1], 'version')
if not current then
  return -1
end
if tonumber(current) ~= tonumber(ARGV[1]) then
  return 0
end
local bumped = tonumber(current) + 1
redis.call('HSET', KEYS[1], 'version', bumped, 'data', ARGV[2], 'updated', ARGV[3])
return bumped
"#;

const PUT_SCRIPT: &str = r#"
local bumped = redis.call('HINCRBY', KEYS[1], 'version', 1)
redis.call('HSET', KEYS[1], 'data', ARGV[1], 'updated', ARGV[2])
redis.call('SADD', KEYS[2], ARGV[3])
return bumped
"#;

/// Document store client for Redis / Valkey.
pub struct RedisStore {
    client: redis::Client,
    namespace: String,
    create_script: Script,
    replace_script: Script,
    put_script: Script,
}

impl RedisStore {
    /// Create a new store client. Does not connect until first use.
    pub fn new(redis_url: &str, namespace: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            namespace: namespace.to_string(),
            create_script: Script::new(CREATE_SCRIPT),
            replace_script: Script::new(REPLACE_SCRIPT),
            put_script: Script::new(PUT_SCRIPT),
        })
    }

    fn doc_key(&self, collection: &str, id: &str) -> String {
        format!("{}:{}:{}", self.namespace, collection, id)
    }

    fn index_key(&self, collection: &str) -> String {
        format!("{}:{}:_ids", self.namespace, collection)
    }

    async fn connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

/// Decode a document hash. An empty hash means the key does not exist.
fn parse_document(id: &str, fields: HashMap<String, String>) -> StoreResult<Option<StoredDocument>> {
    if fields.is_empty() {
        return Ok(None);
    }

    let version = fields
        .get("version")
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| StoreError::request_failed(format!("Document {id} has no version")))?;
    let data = match fields.get("data") {
        Some(raw) => serde_json::from_str(raw)?,
        None => Value::Null,
    };
    let update_time = fields
        .get("updated")
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Ok(Some(StoredDocument {
        id: id.to_string(),
        version,
        data,
        update_time,
    }))
}

#[async_trait]
impl DocumentStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
        let mut conn = self.connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(self.doc_key(collection, id)).await?;
        parse_document(id, fields)
    }

    async fn create(&self, collection: &str, id: &str, data: Value) -> StoreResult<StoredDocument> {
        let mut conn = self.connection().await?;
        let now = Utc::now();
        let created: i64 = self
            .create_script
            .key(self.doc_key(collection, id))
            .key(self.index_key(collection))
            .arg(serde_json::to_string(&data)?)
            .arg(now.to_rfc3339())
            .arg(id)
            .invoke_async(&mut conn)
            .await?;

        if created == 0 {
            return Err(StoreError::AlreadyExists(format!("{collection}/{id}")));
        }
        debug!(collection, id, "Created document");
        Ok(StoredDocument {
            id: id.to_string(),
            version: 1,
            data,
            update_time: now,
        })
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        expected_version: u64,
    ) -> StoreResult<StoredDocument> {
        let mut conn = self.connection().await?;
        let now = Utc::now();
        let next: i64 = self
            .replace_script
            .key(self.doc_key(collection, id))
            .arg(expected_version)
            .arg(serde_json::to_string(&data)?)
            .arg(now.to_rfc3339())
            .invoke_async(&mut conn)
            .await?;

        match next {
            -1 => Err(StoreError::not_found(format!("{collection}/{id}"))),
            0 => Err(StoreError::PreconditionFailed(format!(
                "{collection}/{id} changed since version {expected_version}"
            ))),
            v => Ok(StoredDocument {
                id: id.to_string(),
                version: v as u64,
                data,
                update_time: now,
            }),
        }
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> StoreResult<StoredDocument> {
        let mut conn = self.connection().await?;
        let now = Utc::now();
        let version: i64 = self
            .put_script
            .key(self.doc_key(collection, id))
            .key(self.index_key(collection))
            .arg(serde_json::to_string(&data)?)
            .arg(now.to_rfc3339())
            .arg(id)
            .invoke_async(&mut conn)
            .await?;

        Ok(StoredDocument {
            id: id.to_string(),
            version: version as u64,
            data,
            update_time: now,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.del(self.doc_key(collection, id)).await?;
        conn.srem::<_, _, ()>(self.index_key(collection), id).await?;
        Ok(removed > 0)
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.smembers(self.index_key(collection)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hgetall(self.doc_key(collection, id));
        }
        let rows: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        let mut docs = Vec::with_capacity(rows.len());
        for (id, fields) in ids.iter().zip(rows) {
            // Index entries can outlive a document deleted by another client
            if let Some(doc) = parse_document(id, fields)? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
