//! HTTP routes for a wizard.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{routing::any, Router};

use crate::domain::wizard::{edit_route, join_url, Wizard};

use super::handlers::{handle_step, WizardAppState};

/// Mounts every step of `wizard` at `<base_url><route>` and
/// `<base_url><route>/edit`. The edit path is skipped when a step of the
/// same name is declared.
pub fn wizard_router(wizard: Arc<Wizard>) -> Router {
    let base_url = wizard.settings().base_url.clone();
    let routes: HashSet<&str> = wizard.routes().collect();
    let mut router = Router::new();
    for route in &routes {
        router = router.route(&join_url(&base_url, route), any(handle_step));
        let edit = edit_route(route);
        if !routes.contains(edit.as_str()) {
            router = router.route(&join_url(&base_url, &edit), any(handle_step));
        }
    }
    router.with_state(WizardAppState::new(wizard))
}
