use serde_json::{Map, Value};

use crate::domain::foundation::WizardError;
use crate::domain::wizard::context::StepContext;
use crate::domain::wizard::controller::StepController;

use super::Behaviour;

/// Resets the wizard's session slice once the values for display have been
/// read. Typically placed on a confirmation page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearSession;

impl Behaviour for ClearSession {
    fn name(&self) -> &str {
        "clear-session"
    }

    fn get_values(
        &self,
        ctx: &mut StepContext,
        inner: &dyn StepController,
    ) -> Result<Map<String, Value>, WizardError> {
        let values = inner.get_values(ctx)?;
        ctx.session_model.reset();
        Ok(values)
    }
}
