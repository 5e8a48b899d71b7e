//! In-memory session store for testing and development.
//!
//! Records live in a HashMap. An expired record loads as missing, and every
//! save sweeps all expired records out of the map. Not suitable for
//! multi-server deployments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::wizard::SessionRecord;
use crate::ports::{SessionStore, SessionStoreError};

#[derive(Debug, Clone)]
struct StoredSession {
    record: SessionRecord,
    expires_at: DateTime<Utc>,
}

/// In-memory session store.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, StoredSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored (possibly expired) sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: SessionId) -> Result<Option<SessionRecord>, SessionStoreError> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&id) {
                None => return Ok(None),
                Some(stored) if stored.expires_at > now => {
                    return Ok(Some(stored.record.clone()));
                }
                Some(_) => {}
            }
        }

        self.sessions.write().await.remove(&id);
        tracing::debug!(session_id = %id, "expired session dropped");
        Ok(None)
    }

    async fn save(
        &self,
        id: SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.expires_at > now);
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::debug!(swept, "expired sessions swept");
        }

        sessions.insert(
            id,
            StoredSession {
                record: record.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}
