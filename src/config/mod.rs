//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `HOF` prefix and nested
//! values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use hof_wizard::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Serving {}", config.wizard.definition.display());
//! ```

mod error;
mod redis;
mod server;
mod session;
mod wizard;

pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use session::{SessionConfig, SessionStoreKind, MIN_SECRET_LEN};
pub use wizard::WizardConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Session cookie and store configuration
    pub session: SessionConfig,

    /// Redis configuration, required for the redis session store
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// Wizard definition to serve
    #[serde(default)]
    pub wizard: WizardConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `HOF` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `HOF__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `HOF__SESSION__SECRET=...` -> `session.secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().prefix("HOF").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid, or
    /// if the redis store is selected without a redis section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.session.validate()?;
        self.wizard.validate()?;
        match (&self.redis, self.session.store) {
            (Some(redis), _) => redis.validate()?,
            (None, SessionStoreKind::Redis) => {
                return Err(ValidationError::MissingRequired("REDIS_URL"))
            }
            (None, SessionStoreKind::Memory) => {}
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "HOF__SESSION__SECRET",
        "HOF__SESSION__STORE",
        "HOF__SESSION__TTL_SECS",
        "HOF__REDIS__URL",
        "HOF__SERVER__PORT",
        "HOF__SERVER__ENVIRONMENT",
        "HOF__WIZARD__DEFINITION",
        "HOF__WIZARD__BASE_URL",
    ];

    fn set_minimal_env() {
        env::set_var("HOF__SESSION__SECRET", "0123456789abcdef0123");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        set_minimal_env();
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let result = load_with(&[]);

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.session.cookie_name, "hof.sid");
        assert_eq!(config.session.store, SessionStoreKind::Memory);
        assert!(config.redis.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.wizard.definition, PathBuf::from("wizard.yaml"));
    }

    #[test]
    fn test_missing_secret_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("HOF__SERVER__ENVIRONMENT", "production")]).unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("HOF__SERVER__PORT", "3000"),
            ("HOF__SESSION__TTL_SECS", "60"),
            ("HOF__WIZARD__BASE_URL", "/apply"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.ttl_secs, 60);
        assert_eq!(config.wizard.base_url, "/apply");
    }

    #[test]
    fn test_redis_store_requires_redis_section() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("HOF__SESSION__STORE", "redis")]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("REDIS_URL"))
        ));

        let config = load_with(&[
            ("HOF__SESSION__STORE", "redis"),
            ("HOF__REDIS__URL", "redis://localhost:6379"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.redis.unwrap().key_prefix, "hof:sess:");
    }
}
