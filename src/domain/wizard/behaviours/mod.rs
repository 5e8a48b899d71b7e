//! Behaviour composition.
//!
//! A behaviour decorates a [`StepController`]: each hook receives the wrapped
//! controller as `inner` and may call through to it before or after adding
//! its own logic. The wizard stacks behaviours at build time, global ones
//! first, so route-level behaviours wrap outermost and see the effects of
//! global ones.
//!
//! Named behaviours resolve against the closed [`BuiltinBehaviour`] set;
//! unknown names fail wizard construction.

mod clear_session;
mod complete;
mod summary;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::domain::foundation::{ConfigurationError, WizardError};

use super::context::StepContext;
use super::controller::{ControllerOptions, StepController};

pub use clear_session::ClearSession;
pub use complete::{Complete, COMPLETE_KEY};
pub use summary::Summary;

/// A controller decorator. Every hook defaults to delegating to `inner`.
pub trait Behaviour: Send + Sync {
    fn name(&self) -> &str;

    fn configure(
        &self,
        ctx: &mut StepContext,
        inner: &dyn StepController,
    ) -> Result<(), WizardError> {
        inner.configure(ctx)
    }

    fn get_values(
        &self,
        ctx: &mut StepContext,
        inner: &dyn StepController,
    ) -> Result<Map<String, Value>, WizardError> {
        inner.get_values(ctx)
    }

    fn locals(&self, ctx: &StepContext, inner: &dyn StepController) -> Map<String, Value> {
        inner.locals(ctx)
    }

    fn process(&self, ctx: &mut StepContext, inner: &dyn StepController) -> Result<(), WizardError> {
        inner.process(ctx)
    }

    fn validate(&self, ctx: &StepContext, inner: &dyn StepController) -> BTreeMap<String, String> {
        inner.validate(ctx)
    }

    fn save_values(
        &self,
        ctx: &mut StepContext,
        inner: &dyn StepController,
    ) -> Result<(), WizardError> {
        inner.save_values(ctx)
    }

    fn get_fork_target(&self, ctx: &StepContext, inner: &dyn StepController) -> Option<String> {
        inner.get_fork_target(ctx)
    }

    fn next_step(
        &self,
        ctx: &StepContext,
        target: Option<&str>,
        inner: &dyn StepController,
    ) -> Option<String> {
        inner.next_step(ctx, target)
    }

    fn success_handler(
        &self,
        ctx: &mut StepContext,
        inner: &dyn StepController,
    ) -> Result<(), WizardError> {
        inner.success_handler(ctx)
    }
}

/// Built-in behaviours addressable by name in wizard definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinBehaviour {
    Complete,
    ClearSession,
    Summary,
}

impl BuiltinBehaviour {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinBehaviour::Complete => "complete",
            BuiltinBehaviour::ClearSession => "clear-session",
            BuiltinBehaviour::Summary => "summary",
        }
    }

    pub fn instantiate(self) -> Arc<dyn Behaviour> {
        match self {
            BuiltinBehaviour::Complete => Arc::new(Complete),
            BuiltinBehaviour::ClearSession => Arc::new(ClearSession),
            BuiltinBehaviour::Summary => Arc::new(Summary),
        }
    }
}

impl fmt::Display for BuiltinBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinBehaviour {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(BuiltinBehaviour::Complete),
            "clear-session" => Ok(BuiltinBehaviour::ClearSession),
            "summary" => Ok(BuiltinBehaviour::Summary),
            other => Err(ConfigurationError::UnknownBehaviour(other.to_string())),
        }
    }
}

/// A behaviour as declared: by name, or supplied directly.
#[derive(Clone)]
pub enum BehaviourSpec {
    Named(String),
    Custom(Arc<dyn Behaviour>),
}

impl BehaviourSpec {
    pub fn named(name: impl Into<String>) -> Self {
        BehaviourSpec::Named(name.into())
    }

    pub fn custom<B: Behaviour + 'static>(behaviour: B) -> Self {
        BehaviourSpec::Custom(Arc::new(behaviour))
    }

    /// Resolves the declaration to a behaviour instance.
    pub fn resolve(&self) -> Result<Arc<dyn Behaviour>, ConfigurationError> {
        match self {
            BehaviourSpec::Named(name) => Ok(name.parse::<BuiltinBehaviour>()?.instantiate()),
            BehaviourSpec::Custom(behaviour) => Ok(Arc::clone(behaviour)),
        }
    }
}

impl fmt::Debug for BehaviourSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BehaviourSpec::Named(name) => f.debug_tuple("Named").field(name).finish(),
            BehaviourSpec::Custom(behaviour) => {
                f.debug_tuple("Custom").field(&behaviour.name()).finish()
            }
        }
    }
}

impl<'de> Deserialize<'de> for BehaviourSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(BehaviourSpec::Named)
    }
}

/// A controller wrapped in one behaviour.
pub struct Mixin {
    behaviour: Arc<dyn Behaviour>,
    inner: Box<dyn StepController>,
}

impl Mixin {
    pub fn new(behaviour: Arc<dyn Behaviour>, inner: Box<dyn StepController>) -> Self {
        Self { behaviour, inner }
    }
}

impl StepController for Mixin {
    fn options(&self) -> &ControllerOptions {
        self.inner.options()
    }

    fn configure(&self, ctx: &mut StepContext) -> Result<(), WizardError> {
        self.behaviour.configure(ctx, self.inner.as_ref())
    }

    fn get_values(&self, ctx: &mut StepContext) -> Result<Map<String, Value>, WizardError> {
        self.behaviour.get_values(ctx, self.inner.as_ref())
    }

    fn locals(&self, ctx: &StepContext) -> Map<String, Value> {
        self.behaviour.locals(ctx, self.inner.as_ref())
    }

    fn process(&self, ctx: &mut StepContext) -> Result<(), WizardError> {
        self.behaviour.process(ctx, self.inner.as_ref())
    }

    fn validate(&self, ctx: &StepContext) -> BTreeMap<String, String> {
        self.behaviour.validate(ctx, self.inner.as_ref())
    }

    fn save_values(&self, ctx: &mut StepContext) -> Result<(), WizardError> {
        self.behaviour.save_values(ctx, self.inner.as_ref())
    }

    fn get_fork_target(&self, ctx: &StepContext) -> Option<String> {
        self.behaviour.get_fork_target(ctx, self.inner.as_ref())
    }

    fn next_step(&self, ctx: &StepContext, target: Option<&str>) -> Option<String> {
        self.behaviour.next_step(ctx, target, self.inner.as_ref())
    }

    fn success_handler(&self, ctx: &mut StepContext) -> Result<(), WizardError> {
        self.behaviour.success_handler(ctx, self.inner.as_ref())
    }
}

/// Resolves `specs` and stacks them onto `base` in order; the last spec
/// ends up outermost.
pub fn compose(
    base: Box<dyn StepController>,
    specs: &[BehaviourSpec],
) -> Result<Box<dyn StepController>, ConfigurationError> {
    specs.iter().try_fold(base, |controller, spec| {
        let behaviour = spec.resolve()?;
        tracing::debug!(
            route = %controller.options().route,
            behaviour = behaviour.name(),
            "applying behaviour"
        );
        Ok(Box::new(Mixin::new(behaviour, controller)) as Box<dyn StepController>)
    })
}
