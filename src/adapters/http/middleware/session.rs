//! Session middleware for axum.
//!
//! Loads the session named by the session cookie from the `SessionStore`
//! port, exposes it to handlers as a `SessionHandle` request extension and
//! saves it back once the handler has produced a response.
//!
//! ```text
//! Request → session_middleware → load record (or start a fresh session)
//!                  ↓
//!          Handler reads Extension<SessionHandle>
//!                  ↓
//!          save record, set cookie for new sessions → Response
//! ```
//!
//! A session that cannot be found (unknown id, expired, bad signature or no
//! cookie) is started fresh. The wizard's session check uses that freshness
//! to detect timeouts.
//!
//! With a signing secret configured the cookie value is
//! `<session id>.<hex(HMAC-SHA256(secret, id))>`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::foundation::{SessionId, WizardError};
use crate::domain::wizard::{lock, parse_cookies, ResponseCookie, Session};
use crate::ports::SessionStore;

type HmacSha256 = Hmac<Sha256>;

/// Session middleware state.
#[derive(Clone)]
pub struct SessionState {
    store: Arc<dyn SessionStore>,
    cookie_name: String,
    ttl: Duration,
    secure: bool,
    secret: Option<Arc<SecretString>>,
}

impl SessionState {
    pub fn new(store: Arc<dyn SessionStore>, cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            cookie_name: cookie_name.into(),
            ttl,
            secure: false,
            secret: None,
        }
    }

    /// Signs session cookies with `secret`; unsigned cookies are then ignored.
    pub fn with_signing_secret(mut self, secret: SecretString) -> Self {
        self.secret = Some(Arc::new(secret));
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn mac(secret: &SecretString, id: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(id.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// The cookie value carrying `id`.
    pub fn cookie_value(&self, id: SessionId) -> String {
        let id = id.to_string();
        match &self.secret {
            Some(secret) => format!("{}.{}", id, hex::encode(Self::mac(secret, &id))),
            None => id,
        }
    }

    /// The session id carried by a cookie value, if it is well formed and
    /// correctly signed.
    pub fn session_id(&self, value: &str) -> Option<SessionId> {
        let Some(secret) = &self.secret else {
            return value.parse().ok();
        };
        let (id, signature) = value.split_once('.')?;
        let provided = hex::decode(signature).ok()?;
        let expected = Self::mac(secret, id);
        if expected.len() != provided.len() {
            return None;
        }
        if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            id.parse().ok()
        } else {
            tracing::warn!("session cookie signature mismatch");
            None
        }
    }
}

pub async fn session_middleware(
    State(state): State<SessionState>,
    mut request: Request,
    next: Next,
) -> Response {
    let requested = parse_cookies(request.headers())
        .get(&state.cookie_name)
        .and_then(|value| state.session_id(value));

    let session = match requested {
        Some(id) => match state.store.load(id).await {
            Ok(Some(record)) => Session::loaded(id, record),
            Ok(None) => {
                tracing::debug!(session_id = %id, "session not found, starting fresh");
                Session::fresh()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load session");
                return WizardError::SessionStore(e.to_string()).into_response();
            }
        },
        None => Session::fresh(),
    };

    let is_new = session.is_fresh();
    let handle = session.into_handle();
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    let (id, record) = {
        let session = lock(&handle);
        (session.id(), session.data().clone())
    };
    if let Err(e) = state.store.save(id, &record, state.ttl).await {
        tracing::error!(session_id = %id, error = %e, "failed to save session");
        return WizardError::SessionStore(e.to_string()).into_response();
    }

    if is_new {
        let cookie = ResponseCookie::new(state.cookie_name.clone(), state.cookie_value(id)).secure(state.secure);
        if let Ok(value) = HeaderValue::from_str(&cookie.to_header_value()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::session::InMemorySessionStore;

    fn state() -> SessionState {
        SessionState::new(
            Arc::new(InMemorySessionStore::new()),
            "hof.sid",
            Duration::from_secs(60),
        )
    }

    #[test]
    fn unsigned_cookie_carries_plain_id() {
        let state = state();
        let id = SessionId::new();
        assert_eq!(state.cookie_value(id), id.to_string());
        assert_eq!(state.session_id(&id.to_string()), Some(id));
    }

    #[test]
    fn signed_cookie_round_trips() {
        let state = state().with_signing_secret(SecretString::new("a-long-enough-secret".into()));
        let id = SessionId::new();
        let value = state.cookie_value(id);

        assert!(value.starts_with(&id.to_string()));
        assert_eq!(state.session_id(&value), Some(id));
    }

    #[test]
    fn signed_state_rejects_unsigned_and_forged_cookies() {
        let state = state().with_signing_secret(SecretString::new("a-long-enough-secret".into()));
        let other = state_with_secret("another-secret-value");
        let id = SessionId::new();

        assert_eq!(state.session_id(&id.to_string()), None);
        assert_eq!(state.session_id(&other.cookie_value(id)), None);
        assert_eq!(state.session_id(&format!("{}.zz", id)), None);
    }

    fn state_with_secret(secret: &str) -> SessionState {
        state().with_signing_secret(SecretString::new(secret.to_string()))
    }
}
