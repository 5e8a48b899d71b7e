use crate::domain::foundation::WizardError;
use crate::domain::wizard::context::StepContext;
use crate::domain::wizard::controller::StepController;

use super::Behaviour;

/// Session slice flag marking the whole journey as finished.
pub const COMPLETE_KEY: &str = "complete";

/// Marks the journey complete once the step succeeds. Later requests to
/// steps that are not `allow_post_complete` start the journey over.
#[derive(Debug, Clone, Copy, Default)]
pub struct Complete;

impl Behaviour for Complete {
    fn name(&self) -> &str {
        "complete"
    }

    fn success_handler(
        &self,
        ctx: &mut StepContext,
        inner: &dyn StepController,
    ) -> Result<(), WizardError> {
        inner.success_handler(ctx)?;
        ctx.session_model.set(COMPLETE_KEY, true);
        tracing::debug!(route = %ctx.route, "journey marked complete");
        Ok(())
    }
}
