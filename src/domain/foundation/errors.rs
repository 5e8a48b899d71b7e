//! Error types for the wizard engine.
//!
//! Two families exist:
//!
//! - [`WizardError`] - per-request conditions. These are returned as `Err`
//!   from the guard middleware and step pipeline and rendered by the host's
//!   error mapping (see `adapters::http`). They are recoverable.
//! - [`ConfigurationError`] - problems with a wizard definition detected
//!   while building the wizard. These are fatal at startup.

use std::fmt;
use thiserror::Error;

/// Error codes surfaced to the error-rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A step was requested before any of its prerequisites were visited.
    MissingPrereq,
    /// A session cookie was presented but the session itself has expired.
    SessionTimeout,
    /// CSRF token missing or invalid on an unsafe request.
    CsrfError,
    /// No step is mounted at the requested path.
    NotFound,
    /// The step does not handle the request method.
    MethodNotAllowed,
    /// The session store could not be read or written.
    SessionStoreError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::MissingPrereq => "MISSING_PREREQ",
            ErrorCode::SessionTimeout => "SESSION_TIMEOUT",
            ErrorCode::CsrfError => "CSRF_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorCode::SessionStoreError => "SESSION_STORE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Per-request error raised while handling a wizard step.
#[derive(Debug, Clone, Error)]
pub enum WizardError {
    #[error("Missing prerequisite steps for {route}")]
    MissingPrereq {
        /// The step that was requested.
        route: String,
        /// Where the user should be sent to resume the journey.
        redirect: String,
    },

    #[error("Session timed out")]
    SessionTimeout,

    #[error("Invalid CSRF token")]
    CsrfError,

    #[error("No step at {0}")]
    NotFound(String),

    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WizardError {
    /// Returns the code used by the error-rendering layer.
    pub fn code(&self) -> ErrorCode {
        match self {
            WizardError::MissingPrereq { .. } => ErrorCode::MissingPrereq,
            WizardError::SessionTimeout => ErrorCode::SessionTimeout,
            WizardError::CsrfError => ErrorCode::CsrfError,
            WizardError::NotFound(_) => ErrorCode::NotFound,
            WizardError::MethodNotAllowed(_) => ErrorCode::MethodNotAllowed,
            WizardError::SessionStore(_) => ErrorCode::SessionStoreError,
            WizardError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Creates a missing-prerequisite error for `route`.
    pub fn missing_prereq(route: impl Into<String>, redirect: impl Into<String>) -> Self {
        WizardError::MissingPrereq {
            route: route.into(),
            redirect: redirect.into(),
        }
    }
}

/// Startup-time errors building a wizard or one of its parts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Session model requires a non-empty session key")]
    MissingSessionKey,

    #[error("Unknown behaviour '{0}'")]
    UnknownBehaviour(String),

    #[error("Unknown step '{0}'")]
    UnknownStep(String),

    #[error("Wizard has no steps")]
    NoSteps,

    #[error("CSRF protection is enabled but no token generator was supplied")]
    MissingCsrfTokens,

    #[error("Invalid wizard definition: {0}")]
    InvalidDefinition(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_display_formats_wire_codes() {
        assert_eq!(ErrorCode::MissingPrereq.to_string(), "MISSING_PREREQ");
        assert_eq!(ErrorCode::SessionTimeout.to_string(), "SESSION_TIMEOUT");
        assert_eq!(ErrorCode::CsrfError.to_string(), "CSRF_ERROR");
    }

    #[test]
    fn wizard_error_maps_to_code() {
        assert_eq!(
            WizardError::missing_prereq("/step2", "/step1").code(),
            ErrorCode::MissingPrereq
        );
        assert_eq!(WizardError::SessionTimeout.code(), ErrorCode::SessionTimeout);
        assert_eq!(WizardError::CsrfError.code(), ErrorCode::CsrfError);
        assert_eq!(
            WizardError::SessionStore("down".to_string()).code(),
            ErrorCode::SessionStoreError
        );
    }

    #[test]
    fn missing_prereq_displays_route() {
        let err = WizardError::missing_prereq("/step3", "/");
        assert_eq!(err.to_string(), "Missing prerequisite steps for /step3");
    }

    #[test]
    fn configuration_error_names_behaviour() {
        let err = ConfigurationError::UnknownBehaviour("mystery".to_string());
        assert_eq!(err.to_string(), "Unknown behaviour 'mystery'");
    }
}
