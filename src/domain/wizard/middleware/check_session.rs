use crate::domain::foundation::WizardError;
use crate::domain::wizard::context::{ResponseCookie, StepContext};
use crate::domain::wizard::controller::StepController;

use super::{Flow, StepMiddleware};

/// Cookie signalling that the browser has an established wizard session.
pub const SESSION_COOKIE: &str = "hof-wizard-sc";

/// Detects expired sessions.
///
/// A request carrying the session cookie whose session had to be created
/// afresh has lost its server-side state, so it fails with
/// `SESSION_TIMEOUT`. Otherwise the cookie is (re)issued.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckSession;

impl StepMiddleware for CheckSession {
    fn name(&self) -> &'static str {
        "check-session"
    }

    fn handle(
        &self,
        ctx: &mut StepContext,
        controller: &dyn StepController,
    ) -> Result<Flow, WizardError> {
        let options = controller.options();
        if !options.step.check_session {
            return Ok(Flow::Continue);
        }
        let is_start = options.route == options.settings.start();
        if is_start && ctx.method == http::Method::GET {
            return Ok(Flow::Continue);
        }

        if ctx.session_is_fresh() && ctx.cookies.contains_key(SESSION_COOKIE) {
            tracing::info!(route = %ctx.route, "session timed out");
            return Err(WizardError::SessionTimeout);
        }

        ctx.response_cookies
            .push(ResponseCookie::new(SESSION_COOKIE, "1").secure(options.settings.secure_cookies));
        Ok(Flow::Continue)
    }
}
