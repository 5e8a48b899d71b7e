//! SessionModel - attribute store bound to one wizard's session slice.
//!
//! Every mutation is written through to `session[key]` before the call
//! returns; there is no batching or deferred commit. The model also carries
//! the field dependency rules registered by the progress check: changing a
//! field unsets the fields it `invalidates`.

use std::collections::{HashMap, VecDeque};

use serde_json::{Map, Value};

use crate::domain::foundation::ConfigurationError;

use super::session::{lock, SessionHandle};

/// Reserved attribute holding the visited-step history.
pub const STEPS_KEY: &str = "steps";

/// Changed attributes reported by [`SessionModel::set`].
pub type Changes = Map<String, Value>;

/// Construction options for [`SessionModel`].
#[derive(Debug, Clone)]
pub struct SessionModelOptions {
    pub session: SessionHandle,
    pub key: Option<String>,
}

#[derive(Debug)]
pub struct SessionModel {
    key: String,
    session: SessionHandle,
    attributes: Map<String, Value>,
    invalidations: HashMap<String, Vec<String>>,
}

impl SessionModel {
    /// Binds a model to `session[key]`, creating the slice if missing.
    ///
    /// The initial attributes are the persisted slice overlaid with
    /// `overrides`.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::MissingSessionKey` if no key (or an empty key)
    /// is supplied.
    pub fn new(
        overrides: Map<String, Value>,
        options: SessionModelOptions,
    ) -> Result<Self, ConfigurationError> {
        let key = options
            .key
            .filter(|k| !k.is_empty())
            .ok_or(ConfigurationError::MissingSessionKey)?;

        let mut attributes = lock(&options.session).with_slice(&key, |slice| slice.clone());
        attributes.extend(overrides);

        Ok(Self {
            key,
            session: options.session,
            attributes,
            invalidations: HashMap::new(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// The visited-step history, oldest first.
    pub fn steps(&self) -> Vec<String> {
        self.attributes
            .get(STEPS_KEY)
            .and_then(Value::as_array)
            .map(|steps| {
                steps
                    .iter()
                    .filter_map(|s| s.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_steps(&mut self, steps: Vec<String>) -> Changes {
        let value = Value::Array(steps.into_iter().map(Value::String).collect());
        self.set(STEPS_KEY, value)
    }

    /// Sets a single attribute. See [`SessionModel::set_all`].
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Changes {
        let mut attrs = Map::new();
        attrs.insert(name.into(), value.into());
        self.set_all(attrs)
    }

    /// Merges `attrs` into the model and returns the pairs that actually
    /// changed. Changes are persisted immediately, then dependent fields of
    /// every changed attribute are unset.
    pub fn set_all(&mut self, attrs: Map<String, Value>) -> Changes {
        let mut changes = Changes::new();
        for (name, value) in attrs {
            if self.attributes.get(&name) != Some(&value) {
                self.attributes.insert(name.clone(), value.clone());
                changes.insert(name, value);
            }
        }

        if !changes.is_empty() {
            let changed: Vec<String> = changes.keys().cloned().collect();
            tracing::trace!(key = %self.key, changed = ?changed, "session model change");
            self.write_through(&changes);
            self.cascade_invalidations(changed);
        }
        changes
    }

    /// Removes one attribute.
    pub fn unset(&mut self, name: &str) -> Vec<String> {
        self.unset_all(&[name])
    }

    /// Removes attributes, returning the names that were present.
    pub fn unset_all<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let removed = self.remove_attributes(names.iter().map(|n| n.as_ref().to_string()));
        if !removed.is_empty() {
            self.cascade_invalidations(removed.clone());
        }
        removed
    }

    /// Clears every attribute and resets the persisted slice to `{}`.
    pub fn reset(&mut self) {
        self.attributes.clear();
        let mut session = lock(&self.session);
        session.insert(self.key.clone(), Value::Object(Map::new()));
        tracing::debug!(key = %self.key, "session model reset");
    }

    /// Snapshot of all current attributes.
    pub fn to_json(&self) -> Map<String, Value> {
        self.attributes.clone()
    }

    /// Registers a dependency rule: whenever `field` changes, `dependents`
    /// are unset.
    pub fn add_invalidation(&mut self, field: impl Into<String>, dependents: Vec<String>) {
        if dependents.is_empty() {
            return;
        }
        let entry = self.invalidations.entry(field.into()).or_default();
        for dependent in dependents {
            if !entry.contains(&dependent) {
                entry.push(dependent);
            }
        }
    }

    fn write_through(&self, changes: &Changes) {
        lock(&self.session).with_slice(&self.key, |slice| {
            for (name, value) in changes {
                slice.insert(name.clone(), value.clone());
            }
        });
    }

    fn remove_attributes(&mut self, names: impl Iterator<Item = String>) -> Vec<String> {
        let removed: Vec<String> = names
            .filter(|name| self.attributes.remove(name).is_some())
            .collect();
        if !removed.is_empty() {
            lock(&self.session).with_slice(&self.key, |slice| {
                for name in &removed {
                    slice.remove(name);
                }
            });
        }
        removed
    }

    /// Unsets dependents of every changed field, following chains of rules.
    /// Only attributes that were actually present propagate further, so
    /// cyclic rules settle.
    fn cascade_invalidations(&mut self, changed: Vec<String>) {
        let mut queue: VecDeque<String> = changed.into();
        while let Some(field) = queue.pop_front() {
            let Some(dependents) = self.invalidations.get(&field).cloned() else {
                continue;
            };
            let removed = self.remove_attributes(dependents.into_iter());
            if !removed.is_empty() {
                tracing::debug!(key = %self.key, field = %field, invalidated = ?removed, "dependent fields unset");
            }
            queue.extend(removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wizard::session::{Session, SessionHandle};
    use serde_json::json;

    const KEY: &str = "hof-wizard-test";

    fn handle() -> SessionHandle {
        Session::fresh().into_handle()
    }

    fn model(session: &SessionHandle) -> SessionModel {
        SessionModel::new(
            Map::new(),
            SessionModelOptions {
                session: session.clone(),
                key: Some(KEY.to_string()),
            },
        )
        .unwrap()
    }

    fn persisted(session: &SessionHandle) -> Value {
        lock(session).get(KEY).cloned().unwrap_or(Value::Null)
    }

    // ───────────────────────────────────────────────────────────────
    // Construction
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn construction_requires_key() {
        let result = SessionModel::new(
            Map::new(),
            SessionModelOptions {
                session: handle(),
                key: None,
            },
        );
        assert!(matches!(result, Err(ConfigurationError::MissingSessionKey)));

        let result = SessionModel::new(
            Map::new(),
            SessionModelOptions {
                session: handle(),
                key: Some(String::new()),
            },
        );
        assert!(matches!(result, Err(ConfigurationError::MissingSessionKey)));
    }

    #[test]
    fn construction_initialises_empty_slice() {
        let session = handle();
        let _model = model(&session);
        assert_eq!(persisted(&session), json!({}));
    }

    #[test]
    fn overrides_take_precedence_over_persisted_values() {
        let session = handle();
        lock(&session).insert(KEY, json!({"a": 1, "b": 2}));

        let mut overrides = Map::new();
        overrides.insert("b".to_string(), json!(20));
        let model = SessionModel::new(
            overrides,
            SessionModelOptions {
                session: session.clone(),
                key: Some(KEY.to_string()),
            },
        )
        .unwrap();

        assert_eq!(model.get("a"), Some(&json!(1)));
        assert_eq!(model.get("b"), Some(&json!(20)));
    }

    // ───────────────────────────────────────────────────────────────
    // Write-through
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn set_writes_through_immediately() {
        let session = handle();
        let mut model = model(&session);

        model.set("x", 1);

        assert_eq!(persisted(&session)["x"], json!(1));
    }

    #[test]
    fn set_reports_only_changed_pairs() {
        let session = handle();
        let mut model = model(&session);
        model.set("x", 1);

        let mut attrs = Map::new();
        attrs.insert("x".to_string(), json!(1));
        attrs.insert("y".to_string(), json!("new"));
        let changes = model.set_all(attrs);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("y"), Some(&json!("new")));
    }

    #[test]
    fn unset_removes_from_persisted_slice() {
        let session = handle();
        let mut model = model(&session);
        model.set("x", 1);
        model.set("y", 2);

        let removed = model.unset_all(&["x", "missing"]);

        assert_eq!(removed, vec!["x"]);
        assert_eq!(model.get("x"), None);
        assert_eq!(persisted(&session), json!({"y": 2}));
    }

    #[test]
    fn reset_empties_model_and_slice() {
        let session = handle();
        let mut model = model(&session);
        model.set("x", 1);
        model.set_steps(vec!["/a".to_string()]);

        model.reset();

        assert!(model.to_json().is_empty());
        assert_eq!(persisted(&session), json!({}));
    }

    #[test]
    fn steps_round_trip() {
        let session = handle();
        let mut model = model(&session);
        model.set_steps(vec!["/a".to_string(), "/b".to_string()]);

        assert_eq!(model.steps(), vec!["/a", "/b"]);
        assert_eq!(persisted(&session)["steps"], json!(["/a", "/b"]));
    }

    // ───────────────────────────────────────────────────────────────
    // Invalidation rules
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn changing_field_unsets_dependents() {
        let session = handle();
        let mut model = model(&session);
        model.set("country", "uk");
        model.set("postcode", "AB1 2CD");
        model.add_invalidation("country", vec!["postcode".to_string()]);

        model.set("country", "fr");

        assert_eq!(model.get("postcode"), None);
        assert_eq!(persisted(&session).get("postcode"), None);
    }

    #[test]
    fn setting_same_value_keeps_dependents() {
        let session = handle();
        let mut model = model(&session);
        model.set("country", "uk");
        model.set("postcode", "AB1 2CD");
        model.add_invalidation("country", vec!["postcode".to_string()]);

        model.set("country", "uk");

        assert_eq!(model.get_str("postcode"), Some("AB1 2CD"));
    }

    #[test]
    fn invalidation_cascades_and_settles_on_cycles() {
        let session = handle();
        let mut model = model(&session);
        model.set("a", 1);
        model.set("b", 2);
        model.set("c", 3);
        model.add_invalidation("a", vec!["b".to_string()]);
        model.add_invalidation("b", vec!["c".to_string(), "a".to_string()]);

        model.set("a", 10);

        // a changed -> b unset -> c and a unset.
        assert_eq!(model.get("b"), None);
        assert_eq!(model.get("c"), None);
        assert_eq!(model.get("a"), None);
    }
}
