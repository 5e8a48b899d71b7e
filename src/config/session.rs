//! Session configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Shortest accepted session signing secret.
pub const MIN_SECRET_LEN: usize = 16;

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign session cookies
    pub secret: SecretString,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Idle lifetime of a session, refreshed on every save
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    #[serde(default)]
    pub store: SessionStoreKind,

    /// Mark session and wizard cookies `Secure`
    #[serde(default)]
    pub secure_cookies: bool,
}

/// Session store backend
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    #[default]
    Memory,
    Redis,
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            cookie_name: default_cookie_name(),
            ttl_secs: default_ttl(),
            store: SessionStoreKind::default(),
            secure_cookies: false,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("SESSION_SECRET"));
        }
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(ValidationError::SessionSecretTooShort(MIN_SECRET_LEN));
        }
        if self.ttl_secs == 0 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ValidationError::InvalidCookieName);
        }
        Ok(())
    }
}

fn default_cookie_name() -> String {
    "hof.sid".to_string()
}

fn default_ttl() -> u64 {
    1800
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::new("0123456789abcdef");
        assert_eq!(config.cookie_name, "hof.sid");
        assert_eq!(config.ttl(), Duration::from_secs(1800));
        assert_eq!(config.store, SessionStoreKind::Memory);
        assert!(!config.secure_cookies);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_short_secret() {
        let config = SessionConfig::new("short");
        assert!(matches!(
            config.validate(),
            Err(ValidationError::SessionSecretTooShort(MIN_SECRET_LEN))
        ));
    }

    #[test]
    fn test_validation_missing_secret() {
        let config = SessionConfig::new("");
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("SESSION_SECRET"))
        ));
    }

    #[test]
    fn test_validation_zero_ttl() {
        let config = SessionConfig {
            ttl_secs: 0,
            ..SessionConfig::new("0123456789abcdef")
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidSessionTtl)));
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = SessionConfig::new("0123456789abcdef");
        assert!(!format!("{:?}", config).contains("0123456789abcdef"));
    }
}
