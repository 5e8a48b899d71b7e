//! Foundation module - Shared domain primitives.
//!
//! Contains the identifiers and error types that form the vocabulary
//! of the wizard engine.

mod errors;
mod ids;

pub use errors::{ConfigurationError, ErrorCode, WizardError};
pub use ids::SessionId;
