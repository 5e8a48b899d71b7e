//! HTTP handler for wizard steps.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::domain::foundation::WizardError;
use crate::domain::wizard::{parse_cookies, SessionHandle, StepOutcome, StepRequest, StepResponse, Wizard};

use super::dto::{ErrorResponse, ViewModel};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct WizardAppState {
    wizard: Arc<Wizard>,
}

impl WizardAppState {
    pub fn new(wizard: Arc<Wizard>) -> Self {
        Self { wizard }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// ANY <base>/<step>[/edit] - Runs the step pipeline
pub async fn handle_step(
    State(state): State<WizardAppState>,
    Extension(session): Extension<SessionHandle>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let base_url = state.wizard.settings().base_url.clone();
    let fields = if method == Method::POST {
        decode_form(&body)
    } else {
        decode_form(uri.query().unwrap_or("").as_bytes())
    };

    let request = StepRequest {
        method,
        path: step_path(&base_url, uri.path()),
        base_url,
        cookies: parse_cookies(&headers),
        headers,
        body: fields,
    };

    match state.wizard.handle(request, session) {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => e.into_response(),
    }
}

fn decode_form(bytes: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(bytes).into_owned().collect()
}

/// Path of the request relative to the wizard's mount point.
fn step_path(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match path.strip_prefix(base) {
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        Some("") => "/".to_string(),
        _ => path.to_string(),
    }
}

fn outcome_response(outcome: StepOutcome) -> Response {
    let mut response = match outcome.response {
        StepResponse::Render {
            status,
            template,
            locals,
        } => (status, Json(ViewModel { template, locals })).into_response(),
        StepResponse::Redirect(location) => redirect(&location),
    };

    for cookie in &outcome.cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_header_value()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => WizardError::Internal(format!("invalid redirect target {}", location)).into_response(),
    }
}

impl IntoResponse for WizardError {
    fn into_response(self) -> Response {
        let status = match &self {
            WizardError::MissingPrereq { redirect: target, .. } => return redirect(target),
            WizardError::SessionTimeout => StatusCode::UNAUTHORIZED,
            WizardError::CsrfError => StatusCode::FORBIDDEN,
            WizardError::NotFound(_) => StatusCode::NOT_FOUND,
            WizardError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            WizardError::SessionStore(msg) | WizardError::Internal(msg) => {
                tracing::error!(error = %msg, "wizard request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
