//! Session Store Port - Interface for persisting HTTP session records.
//!
//! A session record is the raw key/value content of one end-user session.
//! Wizards keep their state in namespaced slices of it. Stores apply no
//! locking: the last save for a session wins.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::wizard::SessionRecord;

/// Errors that can occur during session store operations
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize session: {0}")]
    DeserializationFailed(String),
}

/// Port for loading and saving session records
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session record
    ///
    /// # Returns
    /// `None` when the session does not exist or has expired
    async fn load(&self, id: SessionId) -> Result<Option<SessionRecord>, SessionStoreError>;

    /// Save a session record, refreshing its time to live
    async fn save(
        &self,
        id: SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;
}
