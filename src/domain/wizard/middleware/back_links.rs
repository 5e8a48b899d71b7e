use url::Url;

use crate::domain::foundation::WizardError;
use crate::domain::wizard::context::{join_url, StepContext};
use crate::domain::wizard::controller::StepController;
use crate::domain::wizard::helpers::route_steps;
use crate::domain::wizard::session::lock;
use crate::domain::wizard::session_model::STEPS_KEY;

use super::{Flow, StepMiddleware};

/// Computes the "previous page" link for GET requests.
///
/// Resolution order: an explicit `back_link` on the step, the most recently
/// visited predecessor, a whitelisted referrer, and finally the most recent
/// whitelisted step recorded by another wizard in the same session.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackLinks;

impl BackLinks {
    fn latest_predecessor(ctx: &StepContext, controller: &dyn StepController) -> Option<String> {
        let options = controller.options();
        let predecessors = route_steps(&options.route, &options.graph);
        let visited = ctx.session_model.steps();
        let latest = visited.iter().rev().find(|step| predecessors.contains(step))?;

        if ctx.base_url == "/" {
            return Some(latest.clone());
        }
        match latest.trim_start_matches('/') {
            "" => Some(ctx.url_for("/")),
            relative => Some(relative.to_string()),
        }
    }

    fn from_referrer(ctx: &StepContext, whitelist: &[String]) -> Option<String> {
        let referrer = ctx.header("referer")?;
        let referrer_path = match Url::parse(referrer) {
            Ok(url) => url.path().to_string(),
            Err(_) => referrer.split(['?', '#']).next().unwrap_or(referrer).to_string(),
        };

        let current = join_url(&ctx.base_url, &ctx.path);
        whitelist
            .iter()
            .find(|link| resolve_link(link, &ctx.base_url, &current).as_deref() == Some(referrer_path.as_str()))
            .cloned()
    }

    fn from_other_wizards(ctx: &StepContext, whitelist: &[String]) -> Option<String> {
        let normalised: Vec<(String, &String)> = whitelist
            .iter()
            .map(|link| (normalise(link), link))
            .collect();

        let session = lock(ctx.session());
        let mut found = None;
        for (_, slice) in session.other_wizard_slices(ctx.session_model.key()) {
            let Some(steps) = slice.get(STEPS_KEY).and_then(|s| s.as_array()) else {
                continue;
            };
            for step in steps.iter().filter_map(|s| s.as_str()) {
                if let Some((_, link)) = normalised
                    .iter()
                    .find(|(path, _)| path == step || path.ends_with(step))
                {
                    found = Some(link.to_string());
                }
            }
        }
        found
    }
}

impl StepMiddleware for BackLinks {
    fn name(&self) -> &'static str {
        "back-links"
    }

    fn handle(
        &self,
        ctx: &mut StepContext,
        controller: &dyn StepController,
    ) -> Result<Flow, WizardError> {
        if ctx.method != http::Method::GET {
            return Ok(Flow::Continue);
        }
        let step = &controller.options().step;

        let visited = ctx.session_model.steps();
        if let Some(last) = visited.last() {
            ctx.is_back_link = *last == ctx.route || step.next.as_deref() == Some(last.as_str());
        }

        if let Some(explicit) = &step.back_link {
            ctx.back_link = explicit.clone();
            return Ok(Flow::Continue);
        }

        ctx.back_link = Self::latest_predecessor(ctx, controller);
        if ctx.back_link.is_none() && !step.back_links.is_empty() {
            ctx.back_link = Self::from_referrer(ctx, &step.back_links)
                .or_else(|| Self::from_other_wizards(ctx, &step.back_links));
        }
        Ok(Flow::Continue)
    }
}

/// Absolute path a whitelist entry stands for. Entries starting with `/`
/// are absolute, `./x` is relative to the current page and anything else
/// is relative to the wizard's base URL.
fn resolve_link(link: &str, base_url: &str, current: &str) -> Option<String> {
    if link.starts_with('/') {
        return Some(link.to_string());
    }
    if link.starts_with("./") {
        let page = Url::parse("http://localhost").ok()?.join(current).ok()?;
        return page.join(link).ok().map(|url| url.path().to_string());
    }
    Some(join_url(base_url, link))
}

fn normalise(link: &str) -> String {
    format!("/{}", link.trim_start_matches("./").trim_start_matches('/'))
}
