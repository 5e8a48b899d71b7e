//! The HTTP session as seen by the wizard engine.
//!
//! A [`Session`] is loaded from the session store at the start of a request,
//! shared with the step pipeline through a [`SessionHandle`], and written back
//! to the store once the response is produced. Wizards keep their state in
//! namespaced slices of the session (see `SessionModel`).
//!
//! Concurrent requests for the same session each work on their own copy;
//! the last one saved wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::domain::foundation::SessionId;

/// Raw key/value content of a session record.
pub type SessionRecord = Map<String, Value>;

/// Shared, request-scoped access to the session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Prefix of the session keys that hold wizard slices.
pub const WIZARD_KEY_PREFIX: &str = "hof-wizard-";

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    data: SessionRecord,
    fresh: bool,
}

impl Session {
    /// A session created for this request; nothing was found in the store.
    pub fn fresh() -> Self {
        Self {
            id: SessionId::new(),
            data: SessionRecord::new(),
            fresh: true,
        }
    }

    /// A session rehydrated from the store.
    pub fn loaded(id: SessionId, data: SessionRecord) -> Self {
        Self {
            id,
            data,
            fresh: false,
        }
    }

    pub fn into_handle(self) -> SessionHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// True when the session did not exist before this request.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn data(&self) -> &SessionRecord {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Runs `f` against the object stored under `key`. A missing or
    /// non-object value is replaced by an empty object first.
    pub fn with_slice<R>(&mut self, key: &str, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        let mut slice = match self.data.remove(key) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let result = f(&mut slice);
        self.data.insert(key.to_string(), Value::Object(slice));
        result
    }

    /// Wizard slices other than `own_key`, in key order.
    pub fn other_wizard_slices<'a>(
        &'a self,
        own_key: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Map<String, Value>)> + 'a {
        self.data.iter().filter_map(move |(key, value)| {
            if key.starts_with(WIZARD_KEY_PREFIX) && key != own_key {
                value.as_object().map(|slice| (key.as_str(), slice))
            } else {
                None
            }
        })
    }
}

/// Locks the session, recovering the data if a previous holder panicked.
pub fn lock(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_session_is_flagged() {
        assert!(Session::fresh().is_fresh());
        assert!(!Session::loaded(SessionId::new(), SessionRecord::new()).is_fresh());
    }

    #[test]
    fn with_slice_initialises_missing_slice() {
        let mut session = Session::fresh();
        session.with_slice("hof-wizard-a", |slice| slice.insert("x".to_string(), json!(1)));
        assert_eq!(session.get("hof-wizard-a"), Some(&json!({"x": 1})));
    }

    #[test]
    fn with_slice_replaces_non_object_value() {
        let mut session = Session::fresh();
        session.insert("hof-wizard-a", json!("corrupt"));
        assert!(session.with_slice("hof-wizard-a", |slice| slice.is_empty()));
        assert_eq!(session.get("hof-wizard-a"), Some(&json!({})));
    }

    #[test]
    fn with_slice_keeps_existing_entries() {
        let mut session = Session::fresh();
        session.insert("hof-wizard-a", json!({"x": 1}));
        session.with_slice("hof-wizard-a", |slice| slice.insert("y".to_string(), json!(2)));
        assert_eq!(session.get("hof-wizard-a"), Some(&json!({"x": 1, "y": 2})));
    }

    #[test]
    fn other_wizard_slices_skips_own_and_foreign_keys() {
        let mut record = SessionRecord::new();
        record.insert("hof-wizard-a".to_string(), json!({"steps": ["/x"]}));
        record.insert("hof-wizard-b".to_string(), json!({"steps": ["/y"]}));
        record.insert("flash".to_string(), json!({}));
        let session = Session::loaded(SessionId::new(), record);

        let keys: Vec<_> = session
            .other_wizard_slices("hof-wizard-a")
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["hof-wizard-b"]);
    }
}
