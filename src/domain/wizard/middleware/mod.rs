//! Guard middleware run before a step's controller.
//!
//! Each [`Step`](super::step::Step) runs its guards in a fixed order:
//! session check, complete check, progress check, CSRF (unless disabled),
//! then back links. A guard either lets the request continue, answers it
//! directly, or fails it with a [`WizardError`].

mod back_links;
mod check_complete;
mod check_progress;
mod check_session;
mod csrf;

use crate::domain::foundation::WizardError;

use super::context::{StepContext, StepResponse};
use super::controller::StepController;

pub use back_links::BackLinks;
pub use check_complete::CheckComplete;
pub use check_progress::CheckProgress;
pub use check_session::{CheckSession, SESSION_COOKIE};
pub use csrf::{Csrf, CSRF_LOCAL, CSRF_SECRET_KEY, CSRF_TOKEN_FIELD};

/// Outcome of a guard.
#[derive(Debug)]
pub enum Flow {
    Continue,
    /// Stop the pipeline and answer with this response.
    Respond(StepResponse),
}

/// A per-request guard attached to a step.
pub trait StepMiddleware: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle(
        &self,
        ctx: &mut StepContext,
        controller: &dyn StepController,
    ) -> Result<Flow, WizardError>;
}

/// Notified synchronously when a step completes successfully.
pub trait CompleteHook: Send + Sync {
    /// `path` overrides the route recorded as completed.
    fn on_complete(&self, ctx: &mut StepContext, controller: &dyn StepController, path: Option<&str>);
}
