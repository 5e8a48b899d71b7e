//! One mounted step: its composed controller, guards and completion hooks.

use std::sync::Arc;

use http::{Method, StatusCode};
use serde_json::{Map, Value};

use crate::domain::foundation::WizardError;

use super::context::{StepContext, StepResponse};
use super::controller::StepController;
use super::middleware::{CompleteHook, Flow, StepMiddleware};

/// Body field requesting to leave the journey without saving.
pub const EXIT_FIELD: &str = "exit";
/// Body field requesting to save the current answers and leave.
pub const SAVE_AND_EXIT_FIELD: &str = "save-and-exit";

pub struct Step {
    controller: Box<dyn StepController>,
    middleware: Vec<Box<dyn StepMiddleware>>,
    hooks: Vec<Arc<dyn CompleteHook>>,
}

impl Step {
    pub fn new(controller: Box<dyn StepController>) -> Self {
        Self {
            controller,
            middleware: Vec::new(),
            hooks: Vec::new(),
        }
    }

    pub fn with_middleware(mut self, middleware: Box<dyn StepMiddleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn on_complete(mut self, hook: Arc<dyn CompleteHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn route(&self) -> &str {
        &self.controller.options().route
    }

    pub fn controller(&self) -> &dyn StepController {
        self.controller.as_ref()
    }

    /// Names of the attached guards, in execution order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Runs the guards, then the controller lifecycle for the method.
    pub fn handle(&self, ctx: &mut StepContext) -> Result<StepResponse, WizardError> {
        let controller = self.controller.as_ref();
        for middleware in &self.middleware {
            if let Flow::Respond(response) = middleware.handle(ctx, controller)? {
                return Ok(response);
            }
        }

        let method = ctx.method.clone();
        match method {
            Method::GET | Method::HEAD => self.get(ctx),
            Method::POST => self.post(ctx),
            other => Err(WizardError::MethodNotAllowed(other.to_string())),
        }
    }

    /// Records the step as completed without a form submission.
    pub fn complete(&self, ctx: &mut StepContext, path: Option<&str>) {
        for hook in &self.hooks {
            hook.on_complete(ctx, self.controller.as_ref(), path);
        }
    }

    fn get(&self, ctx: &mut StepContext) -> Result<StepResponse, WizardError> {
        let controller = self.controller.as_ref();
        controller.configure(ctx)?;
        ctx.form.values = controller.get_values(ctx)?;
        Ok(self.render(ctx, StatusCode::OK))
    }

    fn post(&self, ctx: &mut StepContext) -> Result<StepResponse, WizardError> {
        let controller = self.controller.as_ref();
        let settings = &controller.options().settings;
        controller.configure(ctx)?;

        if ctx.body.contains_key(EXIT_FIELD) {
            return Ok(StepResponse::Redirect(ctx.url_for(&settings.exit_step)));
        }

        controller.process(ctx)?;

        if ctx.body.contains_key(SAVE_AND_EXIT_FIELD) {
            controller.save_values(ctx)?;
            return Ok(StepResponse::Redirect(ctx.url_for(&settings.save_and_exit_step)));
        }

        let errors = controller.validate(ctx);
        if !errors.is_empty() {
            let invalid: Vec<&String> = errors.keys().collect();
            tracing::debug!(route = %ctx.route, fields = ?invalid, "validation failed");
            ctx.form.errors = errors;
            return Ok(self.render(ctx, StatusCode::UNPROCESSABLE_ENTITY));
        }

        controller.save_values(ctx)?;
        self.complete(ctx, None);
        controller.success_handler(ctx)?;

        let target = controller.get_fork_target(ctx);
        let next = controller
            .next_step(ctx, target.as_deref())
            .unwrap_or_else(|| ctx.url_for(&ctx.route));
        Ok(StepResponse::Redirect(next))
    }

    fn render(&self, ctx: &StepContext, status: StatusCode) -> StepResponse {
        let controller = self.controller.as_ref();
        let mut locals: Map<String, Value> = ctx.locals.clone();
        locals.extend(controller.locals(ctx));
        StepResponse::Render {
            status,
            template: controller.options().template(),
            locals,
        }
    }
}
