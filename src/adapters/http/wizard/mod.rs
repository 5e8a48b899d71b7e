//! Wizard HTTP adapter.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, ViewModel};
pub use handlers::{handle_step, WizardAppState};
pub use routes::wizard_router;
