//! HTTP adapters - axum glue for serving wizards.

pub mod middleware;
pub mod wizard;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};

use crate::domain::wizard::Wizard;

pub use middleware::{session_middleware, SessionState};
pub use wizard::{wizard_router, ErrorResponse, ViewModel, WizardAppState};

/// The wizard's routes wrapped in the session middleware.
pub fn wizard_app(wizard: Arc<Wizard>, sessions: SessionState) -> Router {
    wizard_router(wizard).layer(from_fn_with_state(sessions, session_middleware))
}
