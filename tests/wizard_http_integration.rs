//! Integration tests for the wizard HTTP surface.
//!
//! These tests drive the full axum stack (session middleware, wizard router,
//! step guards, base controller) with `tower::ServiceExt::oneshot`, carrying
//! cookies between requests the way a browser would.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use hof_wizard::adapters::csrf::HmacCsrfTokens;
use hof_wizard::adapters::http::{wizard_app, SessionState};
use hof_wizard::adapters::session::InMemorySessionStore;
use hof_wizard::domain::wizard::WizardDefinition;

// =============================================================================
// Test Infrastructure
// =============================================================================

const DEFINITION: &str = r#"
settings:
  name: apply
  base_url: /apply
steps:
  /name:
    fields: [name]
    next: /pet
  /pet:
    fields: [has-pet]
    next: /contact
    forks:
      - target: /pet-name
        condition: { field: has-pet, value: "yes" }
  /pet-name:
    fields: [pet-name]
    next: /contact
  /contact:
    fields: [email]
    next: /confirm
  /confirm:
    behaviours: [summary, complete]
    next: /done
  /done:
    allow_post_complete: true
fields:
  name:
    validate: [required]
  has-pet:
    validate: [required]
    options: ["yes", "no"]
  pet-name:
    validate: [required]
  email:
    validate: [required, email]
"#;

const ROOT_STEP_DEFINITION: &str = r#"
settings:
  name: root
  base_url: /apply
steps:
  /:
    fields: [name]
    next: /next
  /next:
    next: /confirm
  /confirm:
    next: /done
  /done: {}
fields:
  name:
    validate: [required]
"#;

fn app() -> Router {
    app_for(DEFINITION)
}

fn app_for(definition: &str) -> Router {
    let wizard = WizardDefinition::from_yaml_str(definition)
        .unwrap()
        .into_wizard(Arc::new(HmacCsrfTokens::new()))
        .unwrap();
    let sessions = SessionState::new(
        Arc::new(InMemorySessionStore::new()),
        "hof.sid",
        Duration::from_secs(600),
    )
    .with_signing_secret(SecretString::new("integration-test-secret".to_string()));
    wizard_app(Arc::new(wizard), sessions)
}

/// A response reduced to what the tests look at.
struct Page {
    status: StatusCode,
    location: Option<String>,
    body: Value,
}

impl Page {
    fn locals(&self) -> &Value {
        &self.body["locals"]
    }

    fn csrf_token(&self) -> String {
        self.locals()["csrf-token"]
            .as_str()
            .expect("page carries a csrf token")
            .to_string()
    }
}

/// Minimal browser: keeps cookies and the last CSRF token between requests.
struct Browser {
    app: Router,
    cookies: HashMap<String, String>,
    token: Option<String>,
}

impl Browser {
    fn new(app: Router) -> Self {
        Self {
            app,
            cookies: HashMap::new(),
            token: None,
        }
    }

    async fn get(&mut self, path: &str) -> Page {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        let page = self.send(request).await;
        if let Some(token) = page.locals().get("csrf-token").and_then(Value::as_str) {
            self.token = Some(token.to_string());
        }
        page
    }

    /// Posts `fields` together with the last CSRF token seen.
    async fn post(&mut self, path: &str, fields: &[(&str, &str)]) -> Page {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in fields {
            form.append_pair(name, value);
        }
        if let Some(token) = &self.token {
            form.append_pair("x-csrf-token", token);
        }
        self.post_raw(path, form.finish()).await
    }

    async fn post_raw(&mut self, path: &str, body: String) -> Page {
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// GET the step, then POST it.
    async fn submit(&mut self, path: &str, fields: &[(&str, &str)]) -> Page {
        self.get(path).await;
        self.post(path, fields).await
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(path);
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, request: Request<Body>) -> Page {
        let response = self.app.clone().oneshot(request).await.unwrap();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            self.cookies.insert(name.to_string(), value.to_string());
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Page {
            status,
            location,
            body,
        }
    }
}

fn summary_steps(page: &Page) -> Vec<String> {
    page.locals()["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["step"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Journey
// =============================================================================

#[tokio::test]
async fn start_step_renders_view_model_and_issues_session_cookie() {
    let mut browser = Browser::new(app());

    let page = browser.get("/apply/name").await;

    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["template"], "name");
    assert_eq!(page.locals()["route"], "/name");
    assert!(page.locals()["csrf-token"].is_string());
    assert!(browser.cookies.contains_key("hof.sid"));
}

#[tokio::test]
async fn full_journey_reaches_done() {
    let mut browser = Browser::new(app());

    let page = browser.submit("/apply/name", &[("name", "  Jo   Bloggs ")]).await;
    assert_eq!(page.status, StatusCode::FOUND);
    assert_eq!(page.location.as_deref(), Some("/apply/pet"));
    assert!(browser.cookies.contains_key("hof-wizard-sc"));

    let page = browser.submit("/apply/pet", &[("has-pet", "yes")]).await;
    assert_eq!(page.location.as_deref(), Some("/apply/pet-name"));

    let page = browser.submit("/apply/pet-name", &[("pet-name", "Rex")]).await;
    assert_eq!(page.location.as_deref(), Some("/apply/contact"));

    let page = browser.submit("/apply/contact", &[("email", "jo@example.com")]).await;
    assert_eq!(page.location.as_deref(), Some("/apply/confirm"));

    let confirm = browser.get("/apply/confirm").await;
    assert_eq!(confirm.status, StatusCode::OK);
    assert_eq!(
        summary_steps(&confirm),
        vec!["/name", "/pet", "/pet-name", "/contact"]
    );
    assert_eq!(
        confirm.locals()["rows"][0],
        json!({
            "step": "/name",
            "fields": [{ "field": "name", "value": "Jo Bloggs" }],
            "changeLink": "/apply/name/edit",
        })
    );

    let page = browser.post("/apply/confirm", &[]).await;
    assert_eq!(page.location.as_deref(), Some("/apply/done"));

    let done = browser.get("/apply/done").await;
    assert_eq!(done.status, StatusCode::OK);
}

#[tokio::test]
async fn validation_failure_re_renders_with_errors() {
    let mut browser = Browser::new(app());

    let page = browser.submit("/apply/name", &[("name", "   ")]).await;

    assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(page.locals()["errors"], json!({ "name": "required" }));
}

#[tokio::test]
async fn exit_leaves_without_saving() {
    let mut browser = Browser::new(app());

    let page = browser
        .submit("/apply/name", &[("name", "Jo"), ("exit", "")])
        .await;
    assert_eq!(page.location.as_deref(), Some("/apply/exit"));

    let page = browser.get("/apply/name").await;
    assert_eq!(page.locals()["values"], json!({}));
}

// =============================================================================
// Guards
// =============================================================================

#[tokio::test]
async fn skipping_ahead_redirects_to_start() {
    let mut browser = Browser::new(app());

    let page = browser.get("/apply/contact").await;

    assert_eq!(page.status, StatusCode::FOUND);
    assert_eq!(page.location.as_deref(), Some("/apply/name"));
}

#[tokio::test]
async fn post_without_csrf_token_is_forbidden() {
    let mut browser = Browser::new(app());
    browser.get("/apply/name").await;

    let page = browser.post_raw("/apply/name", "name=Jo".to_string()).await;

    assert_eq!(page.status, StatusCode::FORBIDDEN);
    assert_eq!(page.body["code"], "CSRF_ERROR");
}

#[tokio::test]
async fn post_with_forged_csrf_token_is_forbidden() {
    let mut browser = Browser::new(app());
    browser.get("/apply/name").await;
    browser.token = Some("salt-00ff".to_string());

    let page = browser.post("/apply/name", &[("name", "Jo")]).await;

    assert_eq!(page.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn lost_session_reports_timeout() {
    let mut browser = Browser::new(app());
    browser.submit("/apply/name", &[("name", "Jo")]).await;
    assert!(browser.cookies.contains_key("hof-wizard-sc"));

    // A fresh store has forgotten the session; the browser still holds
    // its cookies.
    browser.app = app();
    let page = browser.get("/apply/pet").await;

    assert_eq!(page.status, StatusCode::UNAUTHORIZED);
    assert_eq!(page.body["code"], "SESSION_TIMEOUT");
}

#[tokio::test]
async fn completed_journey_restarts_from_the_beginning() {
    let mut browser = Browser::new(app());
    browser.submit("/apply/name", &[("name", "Jo")]).await;
    browser.submit("/apply/pet", &[("has-pet", "no")]).await;
    browser.submit("/apply/contact", &[("email", "jo@example.com")]).await;
    browser.submit("/apply/confirm", &[]).await;

    let page = browser.get("/apply/name").await;
    assert_eq!(page.status, StatusCode::FOUND);
    assert_eq!(page.location.as_deref(), Some("/apply/name"));

    let page = browser.get("/apply/name").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.locals()["values"], json!({}));
}

// =============================================================================
// Branching and navigation
// =============================================================================

#[tokio::test]
async fn switching_branch_invalidates_abandoned_steps() {
    let mut browser = Browser::new(app());
    browser.submit("/apply/name", &[("name", "Jo")]).await;
    browser.submit("/apply/pet", &[("has-pet", "yes")]).await;
    browser.submit("/apply/pet-name", &[("pet-name", "Rex")]).await;
    browser.submit("/apply/contact", &[("email", "jo@example.com")]).await;

    let page = browser.submit("/apply/pet", &[("has-pet", "no")]).await;
    assert_eq!(page.location.as_deref(), Some("/apply/contact"));

    let confirm = browser.get("/apply/confirm").await;
    assert_eq!(summary_steps(&confirm), vec!["/name", "/pet", "/contact"]);

    let pet_name = browser.get("/apply/pet-name").await;
    assert_eq!(pet_name.locals()["values"], json!({}));
}

#[tokio::test]
async fn back_link_points_at_previous_step() {
    let mut browser = Browser::new(app());
    browser.submit("/apply/name", &[("name", "Jo")]).await;

    let page = browser.get("/apply/pet").await;

    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.locals()["backLink"], "name");
}

#[tokio::test]
async fn edit_mode_returns_to_confirm() {
    let mut browser = Browser::new(app());
    browser.submit("/apply/name", &[("name", "Jo")]).await;
    browser.submit("/apply/pet", &[("has-pet", "no")]).await;
    browser.submit("/apply/contact", &[("email", "jo@example.com")]).await;

    let edit = browser.get("/apply/name/edit").await;
    assert_eq!(edit.locals()["editing"], true);
    assert_eq!(edit.locals()["values"], json!({ "name": "Jo" }));

    let page = browser.post("/apply/name/edit", &[("name", "Joanna")]).await;
    assert_eq!(page.location.as_deref(), Some("/apply/confirm"));

    let confirm = browser.get("/apply/confirm").await;
    assert_eq!(confirm.locals()["rows"][0]["fields"][0]["value"], "Joanna");
}

#[tokio::test]
async fn root_step_under_nested_base_links_back_and_edits() {
    let mut browser = Browser::new(app_for(ROOT_STEP_DEFINITION));
    let page = browser.submit("/apply/", &[("name", "Jo")]).await;
    assert_eq!(page.location.as_deref(), Some("/apply/next"));

    let next = browser.get("/apply/next").await;
    assert_eq!(next.status, StatusCode::OK);
    assert_eq!(next.locals()["backLink"], "/apply/");

    let edit = browser.get("/apply/edit").await;
    assert_eq!(edit.status, StatusCode::OK);
    assert_eq!(edit.locals()["editing"], true);
    assert_eq!(edit.locals()["values"], json!({ "name": "Jo" }));

    let page = browser.post("/apply/edit", &[("name", "Joanna")]).await;
    assert_eq!(page.location.as_deref(), Some("/apply/confirm"));
}
