//! Journey progress: visited-step history, prerequisite gating and
//! invalidation of branches the user no longer follows.
//!
//! On entry the guard registers field dependency rules and checks that at
//! least one prerequisite of the step has been visited. On completion it
//! records the step and, for a POST to a step with forks, unsets the data
//! of every step that is only reachable through a path not taken.
//!
//! Invalidation sources are the step's successors (`next` plus fork
//! targets), treated as follows:
//!
//! | successor                       | treatment                         |
//! |---------------------------------|-----------------------------------|
//! | chosen, does not loop back      | source (fully whitelisted)        |
//! | chosen, loops back              | skipped, loop data is kept        |
//! | not chosen, loops back          | skipped                           |
//! | not chosen, does not loop back  | source                            |
//!
//! The whitelist is everything reachable from the chosen step, or only the
//! current step when the chosen step loops back.

use http::Method;

use crate::domain::foundation::WizardError;
use crate::domain::wizard::context::StepContext;
use crate::domain::wizard::controller::StepController;
use crate::domain::wizard::helpers::{
    all_possible_steps, create_all_visited_steps, is_loop, route_steps,
};

use super::{CompleteHook, Flow, StepMiddleware};

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckProgress;

impl CheckProgress {
    fn register_invalidations(ctx: &mut StepContext, controller: &dyn StepController) {
        let options = controller.options();
        for field in &options.step.fields {
            if let Some(config) = options.fields.get(field) {
                ctx.session_model
                    .add_invalidation(field.clone(), config.invalidates.clone());
            }
        }
    }

    fn prereqs_met(ctx: &StepContext, controller: &dyn StepController) -> bool {
        let options = controller.options();
        if !options.settings.check_journey
            || options.step.entry_point
            || options.route == options.settings.start()
        {
            return true;
        }

        let mut prereqs = options.step.prereqs.clone();
        prereqs.extend(route_steps(&options.route, &options.graph));
        if prereqs.is_empty() {
            return true;
        }

        let visited = ctx.session_model.steps();
        visited.iter().any(|step| prereqs.contains(step))
    }

    fn invalidate(ctx: &mut StepContext, controller: &dyn StepController) {
        let options = controller.options();
        let graph = &options.graph;
        let current = options.route.as_str();

        let Some(chosen) = controller.get_fork_target(ctx) else {
            return;
        };
        let chosen_loops = is_loop(&chosen, current, graph);

        let mut sources: Vec<&str> = Vec::new();
        for path in options.step.successors() {
            let excluded = if path == chosen {
                chosen_loops
            } else {
                is_loop(path, current, graph)
            };
            if !excluded && !sources.contains(&path) {
                sources.push(path);
            }
        }

        let whitelist = if chosen_loops {
            vec![current.to_string()]
        } else {
            create_all_visited_steps(&chosen, graph)
        };

        let mut invalid: Vec<String> = Vec::new();
        for source in sources {
            for step in all_possible_steps(source, graph, None) {
                if !whitelist.contains(&step) && !invalid.contains(&step) {
                    invalid.push(step);
                }
            }
        }

        for step in invalid {
            tracing::debug!(route = %current, step = %step, "Invalidating");
            ctx.session_model.unset_all(graph.fields_of(&step));
            let mut steps = ctx.session_model.steps();
            let before = steps.len();
            steps.retain(|s| s != &step);
            if steps.len() != before {
                ctx.session_model.set_steps(steps);
            }
        }
    }
}

impl StepMiddleware for CheckProgress {
    fn name(&self) -> &'static str {
        "check-progress"
    }

    fn handle(
        &self,
        ctx: &mut StepContext,
        controller: &dyn StepController,
    ) -> Result<Flow, WizardError> {
        Self::register_invalidations(ctx, controller);

        if Self::prereqs_met(ctx, controller) {
            return Ok(Flow::Continue);
        }

        let options = controller.options();
        tracing::info!(route = %options.route, "missing prerequisite steps");
        Err(WizardError::missing_prereq(
            options.route.clone(),
            ctx.url_for(options.settings.start()),
        ))
    }
}

impl CompleteHook for CheckProgress {
    fn on_complete(&self, ctx: &mut StepContext, controller: &dyn StepController, path: Option<&str>) {
        let options = controller.options();
        let completed = path.unwrap_or(&options.route).to_string();

        let mut steps = ctx.session_model.steps();
        steps.retain(|s| s != &completed);
        steps.push(completed.clone());
        ctx.session_model.set_steps(steps);
        tracing::debug!(step = %completed, "step completed");

        if ctx.method == Method::POST && !options.step.forks.is_empty() {
            Self::invalidate(ctx, controller);
        }
    }
}
