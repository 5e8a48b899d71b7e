use serde_json::Value;

use crate::domain::foundation::WizardError;
use crate::domain::wizard::behaviours::COMPLETE_KEY;
use crate::domain::wizard::context::{StepContext, StepResponse};
use crate::domain::wizard::controller::StepController;

use super::{Flow, StepMiddleware};

/// Restarts finished journeys.
///
/// Once the slice is marked complete, any step not flagged
/// `allow_post_complete` resets the slice and redirects to the start.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckComplete;

impl StepMiddleware for CheckComplete {
    fn name(&self) -> &'static str {
        "check-complete"
    }

    fn handle(
        &self,
        ctx: &mut StepContext,
        controller: &dyn StepController,
    ) -> Result<Flow, WizardError> {
        let options = controller.options();
        let complete = ctx.session_model.get(COMPLETE_KEY) == Some(&Value::Bool(true));
        if !complete || options.step.allow_post_complete {
            return Ok(Flow::Continue);
        }

        tracing::debug!(route = %ctx.route, "journey already complete, restarting");
        ctx.session_model.reset();
        Ok(Flow::Respond(StepResponse::Redirect(
            ctx.url_for(options.settings.start()),
        )))
    }
}
