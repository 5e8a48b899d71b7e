//! Wizard definitions loaded from YAML or JSON documents.
//!
//! ```yaml
//! settings:
//!   name: apply
//! steps:
//!   /name:
//!     fields: [name]
//!     next: /confirm
//!   /confirm:
//!     behaviours: [summary, complete]
//! fields:
//!   name:
//!     validate: [required]
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::foundation::ConfigurationError;
use crate::ports::CsrfTokens;

use super::fields::FieldMap;
use super::graph::StepGraph;
use super::wizard::{Wizard, WizardSettings};

#[derive(Debug, Clone, Deserialize)]
pub struct WizardDefinition {
    pub steps: StepGraph,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub settings: WizardSettings,
}

impl WizardDefinition {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str(source).map_err(|e| ConfigurationError::InvalidDefinition(e.to_string()))
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(source).map_err(|e| ConfigurationError::InvalidDefinition(e.to_string()))
    }

    /// Reads a definition from disk. `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::InvalidDefinition(format!("{}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    /// Overrides the mount point declared in the document.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = base_url.into();
        self
    }

    pub fn into_wizard(self, csrf_tokens: Arc<dyn CsrfTokens>) -> Result<Wizard, ConfigurationError> {
        Wizard::new(self.steps, self.fields, self.settings, csrf_tokens)
    }
}
