//! Wizard mounting configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Which wizard definition to serve, and where.
#[derive(Debug, Clone, Deserialize)]
pub struct WizardConfig {
    /// Path of the YAML (or `.json`) wizard definition
    #[serde(default = "default_definition")]
    pub definition: PathBuf,

    /// Mount point, overriding the definition's own `base_url`
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl WizardConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.definition.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("WIZARD_DEFINITION"));
        }
        if !self.base_url.starts_with('/') {
            return Err(ValidationError::InvalidBaseUrl);
        }
        Ok(())
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            definition: default_definition(),
            base_url: default_base_url(),
        }
    }
}

fn default_definition() -> PathBuf {
    PathBuf::from("wizard.yaml")
}

fn default_base_url() -> String {
    "/".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wizard_config_defaults() {
        let config = WizardConfig::default();
        assert_eq!(config.definition, PathBuf::from("wizard.yaml"));
        assert_eq!(config.base_url, "/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_relative_base_url() {
        let config = WizardConfig {
            base_url: "apply".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidBaseUrl)));
    }
}
