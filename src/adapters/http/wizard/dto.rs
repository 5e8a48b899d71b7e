//! Response bodies for the wizard endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::WizardError;

/// Rendering stand-in: the template a step would render and its locals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewModel {
    pub template: String,
    pub locals: Map<String, Value>,
}

/// Error body: `{"error": <message>, "code": <wire code>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&WizardError> for ErrorResponse {
    fn from(error: &WizardError) -> Self {
        Self {
            error: error.to_string(),
            code: error.code().to_string(),
        }
    }
}
