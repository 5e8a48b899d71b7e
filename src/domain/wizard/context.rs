//! Per-request context threaded through guards, controller and hooks.
//!
//! The HTTP adapter translates an incoming request into a [`StepRequest`],
//! the wizard binds it to the session to produce a [`StepContext`], and the
//! pipeline answers with a [`StepResponse`]. Nothing here touches the network.

use std::collections::{BTreeMap, HashMap};

use http::{HeaderMap, Method, StatusCode};
use serde_json::{Map, Value};

use crate::domain::foundation::ConfigurationError;

use super::session::{lock, SessionHandle};
use super::session_model::{SessionModel, SessionModelOptions};

/// Transport-independent view of an incoming request.
#[derive(Debug, Clone)]
pub struct StepRequest {
    pub method: Method,
    /// Request path relative to the wizard's base URL, e.g. `/name/edit`.
    pub path: String,
    /// Mount point of the wizard, e.g. `/apply` (or `/` at the root).
    pub base_url: String,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
    /// Decoded form body (or query string for safe methods).
    pub body: HashMap<String, String>,
}

impl StepRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            base_url: "/".to_string(),
            headers: HeaderMap::new(),
            cookies: HashMap::new(),
            body: HashMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post<I, K, V>(path: impl Into<String>, body: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut request = Self::new(Method::POST, path);
        request.body = body.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        request
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }
}

/// Submitted values and validation errors for the current step.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub values: Map<String, Value>,
    /// Failing validator type per field.
    pub errors: BTreeMap<String, String>,
}

/// Request-scoped state for one step.
#[derive(Debug)]
pub struct StepContext {
    pub method: Method,
    /// Route of the step being handled, e.g. `/name`.
    pub route: String,
    pub path: String,
    pub base_url: String,
    /// True for `<route>/edit` requests.
    pub edit: bool,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
    pub body: HashMap<String, String>,
    pub session_model: SessionModel,
    pub form: FormState,
    /// Values handed to the rendering layer.
    pub locals: Map<String, Value>,
    /// Computed back link; `None` when nothing applies.
    pub back_link: Option<String>,
    /// The user is navigating backwards into this step.
    pub is_back_link: bool,
    pub response_cookies: Vec<ResponseCookie>,
}

impl StepContext {
    /// Binds `request` for `route` to the wizard slice `session_key`.
    pub fn new(
        request: StepRequest,
        route: impl Into<String>,
        session: SessionHandle,
        session_key: &str,
    ) -> Result<Self, ConfigurationError> {
        let route = route.into();
        let edit = request.path.ends_with("/edit") && request.path != route;
        let session_model = SessionModel::new(
            Map::new(),
            SessionModelOptions {
                session,
                key: Some(session_key.to_string()),
            },
        )?;

        Ok(Self {
            method: request.method,
            route,
            path: request.path,
            base_url: request.base_url,
            edit,
            headers: request.headers,
            cookies: request.cookies,
            body: request.body,
            session_model,
            form: FormState::default(),
            locals: Map::new(),
            back_link: None,
            is_back_link: false,
            response_cookies: Vec::new(),
        })
    }

    pub fn session(&self) -> &SessionHandle {
        self.session_model.session()
    }

    /// True when the session did not exist before this request.
    pub fn session_is_fresh(&self) -> bool {
        lock(self.session()).is_fresh()
    }

    /// Header lookup. `referrer` and `referer` are interchangeable.
    pub fn header(&self, name: &str) -> Option<&str> {
        let lookup = |n: &str| self.headers.get(n).and_then(|v| v.to_str().ok());
        match name.to_ascii_lowercase().as_str() {
            "referer" | "referrer" => lookup("referer").or_else(|| lookup("referrer")),
            other => lookup(other),
        }
    }

    /// Body field, falling back to the header of the same name.
    pub fn body_or_header(&self, name: &str) -> Option<&str> {
        self.body
            .get(name)
            .map(String::as_str)
            .or_else(|| self.header(name))
    }

    /// A submitted value for this request, otherwise the stored one.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.form
            .values
            .get(field)
            .or_else(|| self.session_model.get(field))
    }

    /// `path` resolved against the wizard base URL.
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub fn is_safe_method(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }
}

/// Outcome of handling a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResponse {
    /// Render `template` with `locals`.
    Render {
        status: StatusCode,
        template: String,
        locals: Map<String, Value>,
    },
    Redirect(String),
}

/// A cookie to set on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
}

impl ResponseCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            http_only: true,
            secure: false,
        }
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Renders the `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut header = format!("{}={}; Path={}; SameSite=Lax", self.name, self.value, self.path);
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Parses every `Cookie` header into a name/value map.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Joins a base URL and a route, avoiding doubled or missing separators.
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Edit-mode path of `route`. The root step edits at `/edit`.
pub fn edit_route(route: &str) -> String {
    if route == "/" {
        "/edit".to_string()
    } else {
        format!("{}/edit", route.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wizard::session::Session;

    #[test]
    fn join_url_handles_root_and_nested_bases() {
        assert_eq!(join_url("/", "/step1"), "/step1");
        assert_eq!(join_url("", "/step1"), "/step1");
        assert_eq!(join_url("/apply", "/step1"), "/apply/step1");
        assert_eq!(join_url("/apply/", "step1"), "/apply/step1");
    }

    #[test]
    fn edit_route_of_root_step_has_no_double_slash() {
        assert_eq!(edit_route("/"), "/edit");
        assert_eq!(edit_route("/name"), "/name/edit");
    }

    #[test]
    fn parse_cookies_splits_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::COOKIE, "a=1; hof-wizard-sc=1".parse().unwrap());
        let cookies = parse_cookies(&headers);
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(cookies.get("hof-wizard-sc").map(String::as_str), Some("1"));
    }

    #[test]
    fn response_cookie_renders_attributes() {
        let cookie = ResponseCookie::new("hof-wizard-sc", "1").secure(true);
        assert_eq!(
            cookie.to_header_value(),
            "hof-wizard-sc=1; Path=/; SameSite=Lax; HttpOnly; Secure"
        );
    }

    #[test]
    fn context_detects_edit_mode() {
        let session = Session::fresh().into_handle();
        let ctx = StepContext::new(
            StepRequest::get("/name/edit"),
            "/name",
            session.clone(),
            "hof-wizard-test",
        )
        .unwrap();
        assert!(ctx.edit);

        let ctx = StepContext::new(StepRequest::get("/name"), "/name", session, "hof-wizard-test")
            .unwrap();
        assert!(!ctx.edit);
    }

    #[test]
    fn referrer_lookup_accepts_both_spellings() {
        let session = Session::fresh().into_handle();
        let request = StepRequest::get("/a").with_header("referer", "http://example.com/x");
        let ctx = StepContext::new(request, "/a", session, "hof-wizard-test").unwrap();
        assert_eq!(ctx.header("referrer"), Some("http://example.com/x"));
    }

    #[test]
    fn value_prefers_submitted_over_stored() {
        let session = Session::fresh().into_handle();
        let mut ctx = StepContext::new(StepRequest::get("/a"), "/a", session, "hof-wizard-test")
            .unwrap();
        ctx.session_model.set("colour", "red");
        assert_eq!(ctx.value("colour"), Some(&Value::from("red")));

        ctx.form.values.insert("colour".to_string(), Value::from("blue"));
        assert_eq!(ctx.value("colour"), Some(&Value::from("blue")));
    }
}
