use std::sync::Arc;

use serde_json::Value;

use crate::domain::foundation::WizardError;
use crate::domain::wizard::context::StepContext;
use crate::domain::wizard::controller::StepController;
use crate::ports::CsrfTokens;

use super::{Flow, StepMiddleware};

/// Session slice attribute holding the CSRF secret.
pub const CSRF_SECRET_KEY: &str = "csrf-secret";
/// Body field or header carrying the token on unsafe requests.
pub const CSRF_TOKEN_FIELD: &str = "x-csrf-token";
/// Locals entry exposing a fresh token to the rendering layer.
pub const CSRF_LOCAL: &str = "csrf-token";

/// Mints tokens on safe requests and verifies them on unsafe ones.
pub struct Csrf {
    tokens: Arc<dyn CsrfTokens>,
}

impl Csrf {
    pub fn new(tokens: Arc<dyn CsrfTokens>) -> Self {
        Self { tokens }
    }

    fn secret(&self, ctx: &mut StepContext) -> String {
        if let Some(secret) = ctx.session_model.get_str(CSRF_SECRET_KEY) {
            return secret.to_string();
        }
        let secret = self.tokens.secret();
        ctx.session_model.set(CSRF_SECRET_KEY, secret.clone());
        secret
    }
}

impl StepMiddleware for Csrf {
    fn name(&self) -> &'static str {
        "csrf"
    }

    fn handle(
        &self,
        ctx: &mut StepContext,
        _controller: &dyn StepController,
    ) -> Result<Flow, WizardError> {
        let secret = self.secret(ctx);

        if ctx.is_safe_method() {
            let token = self.tokens.create(&secret);
            ctx.locals.insert(CSRF_LOCAL.to_string(), Value::String(token));
            return Ok(Flow::Continue);
        }

        let valid = ctx
            .body_or_header(CSRF_TOKEN_FIELD)
            .is_some_and(|token| self.tokens.verify(&secret, token));
        if valid {
            Ok(Flow::Continue)
        } else {
            tracing::warn!(route = %ctx.route, method = %ctx.method, "CSRF token rejected");
            Err(WizardError::CsrfError)
        }
    }
}
