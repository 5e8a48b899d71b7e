//! Step graph - the declarative map of routes to step options.
//!
//! The graph is built once at startup and never mutated afterwards. It may
//! contain cycles (loops back to earlier steps), so every traversal over it
//! lives in [`super::helpers`] and tracks a visited accumulator.
//!
//! Declaration order is significant: predecessor lists and summaries follow
//! the order steps were written in the definition, so [`StepGraph`] keeps an
//! explicit order alongside its lookup table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::behaviours::BehaviourSpec;
use super::context::StepContext;

/// Predicate form of a fork condition.
pub type ForkPredicate = Arc<dyn Fn(&StepContext) -> bool + Send + Sync>;

/// Condition deciding whether a fork is taken.
#[derive(Clone)]
pub enum ForkCondition {
    /// Taken when the submitted (or stored) value of `field` equals `value`.
    FieldEquals { field: String, value: Value },
    /// Taken when the closure returns true for the current request.
    Predicate(ForkPredicate),
}

impl ForkCondition {
    /// Creates a field-equality condition.
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        ForkCondition::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a predicate condition.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&StepContext) -> bool + Send + Sync + 'static,
    {
        ForkCondition::Predicate(Arc::new(f))
    }
}

impl fmt::Debug for ForkCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForkCondition::FieldEquals { field, value } => f
                .debug_struct("FieldEquals")
                .field("field", field)
                .field("value", value)
                .finish(),
            ForkCondition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for ForkCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct FieldCondition {
            field: String,
            value: Value,
        }

        let raw = FieldCondition::deserialize(deserializer)?;
        Ok(ForkCondition::FieldEquals {
            field: raw.field,
            value: raw.value,
        })
    }
}

/// A conditional alternate successor of a step.
#[derive(Debug, Clone, Deserialize)]
pub struct Fork {
    pub target: String,
    /// A fork without a condition is always taken.
    #[serde(default)]
    pub condition: Option<ForkCondition>,
}

impl Fork {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            condition: None,
        }
    }

    pub fn when(mut self, condition: ForkCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Options declared for one step of the wizard.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StepOptions {
    /// Default successor route.
    pub next: Option<String>,
    pub forks: Vec<Fork>,
    /// Fields collected on this step. Used for invalidation.
    pub fields: Vec<String>,
    /// Steps that must be visited before this one, in addition to the
    /// predecessors derived from the graph.
    pub prereqs: Vec<String>,
    pub behaviours: Vec<BehaviourSpec>,
    /// Explicit back link. `Some(None)` means "deliberately no back link",
    /// which is distinct from `None` (compute one).
    #[serde(deserialize_with = "explicit_back_link")]
    pub back_link: Option<Option<String>>,
    /// Whitelist of external pages that may serve as the back link.
    pub back_links: Vec<String>,
    /// Skip the prerequisite check for this step.
    pub entry_point: bool,
    pub check_session: bool,
    /// Step stays reachable after the journey is marked complete.
    pub allow_post_complete: bool,
    /// In edit mode, follow `next` instead of returning to the confirm step.
    pub continue_on_edit: bool,
    pub template: Option<String>,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            next: None,
            forks: Vec::new(),
            fields: Vec::new(),
            prereqs: Vec::new(),
            behaviours: Vec::new(),
            back_link: None,
            back_links: Vec::new(),
            entry_point: false,
            check_session: true,
            allow_post_complete: false,
            continue_on_edit: false,
            template: None,
        }
    }
}

impl StepOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn fork(mut self, fork: Fork) -> Self {
        self.forks.push(fork);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn prereqs<I, S>(mut self, prereqs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prereqs = prereqs.into_iter().map(Into::into).collect();
        self
    }

    pub fn behaviour(mut self, behaviour: BehaviourSpec) -> Self {
        self.behaviours.push(behaviour);
        self
    }

    pub fn back_link(mut self, back_link: Option<&str>) -> Self {
        self.back_link = Some(back_link.map(str::to_string));
        self
    }

    pub fn back_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.back_links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn entry_point(mut self) -> Self {
        self.entry_point = true;
        self
    }

    pub fn allow_post_complete(mut self) -> Self {
        self.allow_post_complete = true;
        self
    }

    pub fn continue_on_edit(mut self) -> Self {
        self.continue_on_edit = true;
        self
    }

    /// Successors in declaration order: `next` first, then fork targets.
    pub fn successors(&self) -> impl Iterator<Item = &str> {
        self.next
            .as_deref()
            .into_iter()
            .chain(self.forks.iter().map(|f| f.target.as_str()))
    }
}

fn explicit_back_link<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawBackLink {
        Path(String),
        Flag(bool),
    }

    // Only reached when the key is present, so null and false are explicit.
    Ok(match Option::<RawBackLink>::deserialize(deserializer)? {
        None | Some(RawBackLink::Flag(false)) => Some(None),
        Some(RawBackLink::Path(path)) => Some(Some(path)),
        Some(RawBackLink::Flag(true)) => None,
    })
}

/// Ordered mapping from route path to step options.
#[derive(Debug, Clone, Default)]
pub struct StepGraph {
    order: Vec<String>,
    steps: HashMap<String, StepOptions>,
}

impl StepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a step, builder style.
    pub fn step(mut self, route: impl Into<String>, options: StepOptions) -> Self {
        self.insert(route, options);
        self
    }

    /// Inserts or replaces a step. Replacing keeps the original position.
    pub fn insert(&mut self, route: impl Into<String>, options: StepOptions) {
        let route = route.into();
        if !self.steps.contains_key(&route) {
            self.order.push(route.clone());
        }
        self.steps.insert(route, options);
    }

    pub fn get(&self, route: &str) -> Option<&StepOptions> {
        self.steps.get(route)
    }

    pub fn contains(&self, route: &str) -> bool {
        self.steps.contains_key(route)
    }

    /// Routes in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Steps in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StepOptions)> {
        self.order
            .iter()
            .filter_map(move |route| self.steps.get(route).map(|s| (route.as_str(), s)))
    }

    pub fn first(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    /// Fields declared on `route`, empty for unknown routes.
    pub fn fields_of(&self, route: &str) -> &[String] {
        self.steps
            .get(route)
            .map(|s| s.fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<'de> Deserialize<'de> for StepGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GraphVisitor;

        impl<'de> Visitor<'de> for GraphVisitor {
            type Value = StepGraph;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of step routes to step options")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<StepGraph, A::Error> {
                let mut graph = StepGraph::new();
                while let Some((route, options)) = map.next_entry::<String, StepOptions>()? {
                    graph.insert(route, options);
                }
                Ok(graph)
            }
        }

        deserializer.deserialize_map(GraphVisitor)
    }
}
