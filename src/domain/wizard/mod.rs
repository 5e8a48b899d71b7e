//! The form wizard engine.
//!
//! A wizard is a directed, possibly cyclic, graph of steps. Each step is
//! served by a behaviour-composed [`StepController`] behind a fixed chain of
//! guards (session, completion, progress, CSRF, back links). Journey state
//! lives in a per-wizard slice of the HTTP session, accessed through
//! [`SessionModel`].

pub mod behaviours;
mod context;
mod controller;
mod definition;
mod fields;
mod graph;
pub mod helpers;
pub mod middleware;
mod session;
mod session_model;
mod step;
#[allow(clippy::module_inception)]
mod wizard;

pub use behaviours::{Behaviour, BehaviourSpec, BuiltinBehaviour};
pub use context::{
    edit_route, join_url, parse_cookies, FormState, ResponseCookie, StepContext, StepRequest,
    StepResponse,
};
pub use controller::{
    condition_holds, BaseController, ControllerFactory, ControllerOptions, StepController,
};
pub use definition::WizardDefinition;
pub use fields::{FieldConfig, FieldMap, Formatter, ValidationFailure, Validator};
pub use graph::{Fork, ForkCondition, ForkPredicate, StepGraph, StepOptions};
pub use session::{lock, Session, SessionHandle, SessionRecord, WIZARD_KEY_PREFIX};
pub use session_model::{Changes, SessionModel, SessionModelOptions, STEPS_KEY};
pub use step::{Step, EXIT_FIELD, SAVE_AND_EXIT_FIELD};
pub use wizard::{StepOutcome, Wizard, WizardBuilder, WizardSettings};
