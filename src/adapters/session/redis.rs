//! Redis-backed session store for production deployments.
//!
//! Each session is one JSON string under `<prefix><session id>`, written
//! with `SET .. EX` so the TTL is refreshed on every save.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::domain::foundation::SessionId;
use crate::domain::wizard::SessionRecord;
use crate::ports::{SessionStore, SessionStoreError};

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisSessionStore {
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a multiplexed connection to `url`.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, SessionStoreError> {
        let client =
            redis::Client::open(url).map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        Ok(Self::new(conn, key_prefix))
    }

    fn key(&self, id: SessionId) -> String {
        session_key(&self.key_prefix, id)
    }
}

fn session_key(prefix: &str, id: SessionId) -> String {
    format!("{}{}", prefix, id)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: SessionId) -> Result<Option<SessionRecord>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.key(id))
            .query_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| SessionStoreError::DeserializationFailed(e.to_string()))
        })
        .transpose()
    }

    async fn save(
        &self,
        id: SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(record)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(self.key(id))
            .arg(json)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::Unavailable(e.to_string()))
    }
}
