//! hof-wizard server: serves one wizard definition over HTTP.
//!
//! Reads configuration from `HOF__*` environment variables (see
//! `hof_wizard::config`), loads the wizard definition and mounts it behind
//! the session middleware.

use std::error::Error;
use std::sync::Arc;

use hof_wizard::adapters::csrf::HmacCsrfTokens;
use hof_wizard::adapters::http::{wizard_app, SessionState};
use hof_wizard::adapters::session::{InMemorySessionStore, RedisSessionStore};
use hof_wizard::config::{AppConfig, SessionStoreKind};
use hof_wizard::domain::wizard::WizardDefinition;
use hof_wizard::ports::SessionStore;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let mut definition = WizardDefinition::load(&config.wizard.definition)?
        .with_base_url(config.wizard.base_url.clone());
    definition.settings.secure_cookies |= config.session.secure_cookies;
    let wizard = Arc::new(definition.into_wizard(Arc::new(HmacCsrfTokens::new()))?);
    tracing::info!(
        wizard = %wizard.settings().name,
        base_url = %wizard.settings().base_url,
        steps = wizard.routes().count(),
        "wizard loaded"
    );

    let store: Arc<dyn SessionStore> = match (config.session.store, &config.redis) {
        (SessionStoreKind::Redis, Some(redis)) => {
            let store = RedisSessionStore::connect(&redis.url, redis.key_prefix.clone()).await?;
            tracing::info!("using redis session store");
            Arc::new(store)
        }
        _ => {
            tracing::info!("using in-memory session store");
            Arc::new(InMemorySessionStore::new())
        }
    };

    let sessions = SessionState::new(store, config.session.cookie_name.clone(), config.session.ttl())
        .with_secure_cookies(config.session.secure_cookies)
        .with_signing_secret(config.session.secret.clone());

    let app = wizard_app(wizard, sessions).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.server.request_timeout())),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "hof-wizard listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
