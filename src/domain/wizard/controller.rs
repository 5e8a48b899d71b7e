//! Step controllers.
//!
//! A [`StepController`] owns the business logic of one step: reading stored
//! values for display, processing and validating a submission, persisting it
//! and choosing where to go next. The [`Step`](super::step::Step) drives the
//! lifecycle and calls each method on the outermost (behaviour-wrapped)
//! controller, so behaviours see and override every stage.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::domain::foundation::WizardError;

use super::context::{edit_route, join_url, StepContext};
use super::fields::{FieldMap, Formatter};
use super::graph::{ForkCondition, StepGraph, StepOptions};
use super::wizard::WizardSettings;

/// Everything a controller knows about its step, resolved at build time.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub route: String,
    pub step: StepOptions,
    pub settings: Arc<WizardSettings>,
    pub graph: Arc<StepGraph>,
    pub fields: Arc<FieldMap>,
}

impl ControllerOptions {
    pub fn template(&self) -> String {
        self.step
            .template
            .clone()
            .unwrap_or_else(|| self.route.trim_start_matches('/').to_string())
    }
}

/// Per-step request handling.
///
/// All methods take the request context explicitly; controllers are shared
/// across requests and hold no per-request state.
pub trait StepController: Send + Sync {
    fn options(&self) -> &ControllerOptions;

    /// First hook of every request.
    fn configure(&self, ctx: &mut StepContext) -> Result<(), WizardError>;

    /// Values shown on the form.
    fn get_values(&self, ctx: &mut StepContext) -> Result<Map<String, Value>, WizardError>;

    /// Values handed to the rendering layer.
    fn locals(&self, ctx: &StepContext) -> Map<String, Value>;

    /// Reads and formats submitted values into `ctx.form.values`.
    fn process(&self, ctx: &mut StepContext) -> Result<(), WizardError>;

    /// Returns the failing validator per field; empty when valid.
    fn validate(&self, ctx: &StepContext) -> BTreeMap<String, String>;

    fn save_values(&self, ctx: &mut StepContext) -> Result<(), WizardError>;

    /// The route chosen for the current submission: `next`, overridden by
    /// every fork whose condition holds (the last match wins).
    fn get_fork_target(&self, ctx: &StepContext) -> Option<String>;

    /// Full redirect URL for `target`, taking edit mode into account.
    fn next_step(&self, ctx: &StepContext, target: Option<&str>) -> Option<String>;

    /// Runs after values are saved and the step is recorded complete.
    fn success_handler(&self, ctx: &mut StepContext) -> Result<(), WizardError>;
}

/// Factory used by the wizard to build the innermost controller of each
/// step.
pub type ControllerFactory = Arc<dyn Fn(ControllerOptions) -> Box<dyn StepController> + Send + Sync>;

/// The default controller: form fields in, session slice out.
#[derive(Debug)]
pub struct BaseController {
    options: ControllerOptions,
}

impl BaseController {
    pub fn new(options: ControllerOptions) -> Self {
        Self { options }
    }

    fn formatters_for(&self, field: &str) -> &[Formatter] {
        self.options
            .fields
            .get(field)
            .and_then(|config| config.formatter.as_deref())
            .unwrap_or(self.options.settings.formatters.as_slice())
    }
}

impl StepController for BaseController {
    fn options(&self) -> &ControllerOptions {
        &self.options
    }

    fn configure(&self, _ctx: &mut StepContext) -> Result<(), WizardError> {
        Ok(())
    }

    fn get_values(&self, ctx: &mut StepContext) -> Result<Map<String, Value>, WizardError> {
        let mut values = Map::new();
        for field in &self.options.step.fields {
            let stored = ctx.session_model.get(field).cloned().or_else(|| {
                self.options
                    .fields
                    .get(field)
                    .and_then(|config| config.default.clone())
            });
            if let Some(value) = stored {
                values.insert(field.clone(), value);
            }
        }
        Ok(values)
    }

    fn locals(&self, ctx: &StepContext) -> Map<String, Value> {
        let fields: Vec<Value> = self
            .options
            .step
            .fields
            .iter()
            .map(|name| {
                let options = self
                    .options
                    .fields
                    .get(name)
                    .map(|config| config.options.clone())
                    .unwrap_or_default();
                json!({ "key": name, "options": options })
            })
            .collect();

        let mut locals = Map::new();
        locals.insert("route".into(), json!(self.options.route));
        locals.insert("baseUrl".into(), json!(ctx.base_url));
        locals.insert("fields".into(), Value::Array(fields));
        locals.insert("values".into(), Value::Object(ctx.form.values.clone()));
        locals.insert("errors".into(), json!(ctx.form.errors));
        locals.insert("editing".into(), json!(ctx.edit));
        locals.insert("isBackLink".into(), json!(ctx.is_back_link));
        locals.insert("appConfig".into(), Value::Object(self.options.settings.app_config.clone()));
        if let Some(back_link) = &ctx.back_link {
            locals.insert("backLink".into(), json!(back_link));
        }
        locals
    }

    fn process(&self, ctx: &mut StepContext) -> Result<(), WizardError> {
        for field in &self.options.step.fields {
            let raw = ctx.body.get(field).map(String::as_str).unwrap_or("");
            let formatted = Formatter::apply_all(self.formatters_for(field), raw);
            ctx.form.values.insert(field.clone(), Value::String(formatted));
        }
        Ok(())
    }

    fn validate(&self, ctx: &StepContext) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();
        for field in &self.options.step.fields {
            let Some(config) = self.options.fields.get(field) else {
                continue;
            };
            let value = ctx
                .form
                .values
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or("");
            if let Some(failure) = config.check(value) {
                errors.insert(field.clone(), failure.kind);
            }
        }
        errors
    }

    fn save_values(&self, ctx: &mut StepContext) -> Result<(), WizardError> {
        let values = ctx.form.values.clone();
        ctx.session_model.set_all(values);
        Ok(())
    }

    fn get_fork_target(&self, ctx: &StepContext) -> Option<String> {
        let mut target = self.options.step.next.clone();
        for fork in &self.options.step.forks {
            let taken = fork
                .condition
                .as_ref()
                .map_or(true, |condition| condition_holds(condition, ctx));
            if taken {
                target = Some(fork.target.clone());
            }
        }
        target
    }

    fn next_step(&self, ctx: &StepContext, target: Option<&str>) -> Option<String> {
        let target = target?;
        let confirm = self.options.settings.confirm_step.as_str();
        let route = if ctx.edit && !self.options.step.continue_on_edit {
            confirm.to_string()
        } else if ctx.edit && target != confirm {
            edit_route(target)
        } else {
            target.to_string()
        };
        Some(join_url(&ctx.base_url, &route))
    }

    fn success_handler(&self, _ctx: &mut StepContext) -> Result<(), WizardError> {
        Ok(())
    }
}

/// Evaluates a fork condition against the submitted, or else stored, value.
pub fn condition_holds(condition: &ForkCondition, ctx: &StepContext) -> bool {
    match condition {
        ForkCondition::Predicate(predicate) => predicate(ctx),
        ForkCondition::FieldEquals { field, value } => match (ctx.value(field), value) {
            (Some(actual), expected) if actual == expected => true,
            // Form input is always text; compare against the expected
            // value's textual form for numbers and booleans.
            (Some(Value::String(actual)), Value::Bool(_) | Value::Number(_)) => {
                *actual == value.to_string()
            }
            _ => false,
        },
    }
}
