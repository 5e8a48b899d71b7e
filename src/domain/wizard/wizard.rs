//! The wizard factory: turns a step graph, field configuration and settings
//! into a set of mounted [`Step`]s and dispatches requests to them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::foundation::{ConfigurationError, WizardError};
use crate::ports::CsrfTokens;

use super::behaviours::{compose, BehaviourSpec};
use super::context::{ResponseCookie, StepContext, StepRequest, StepResponse};
use super::controller::{BaseController, ControllerFactory, ControllerOptions, StepController};
use super::fields::{FieldMap, Formatter};
use super::graph::StepGraph;
use super::middleware::{BackLinks, CheckComplete, CheckProgress, CheckSession, Csrf};
use super::session::{SessionHandle, WIZARD_KEY_PREFIX};
use super::step::Step;

/// Wizard-wide settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WizardSettings {
    /// Namespaces the session slice (`hof-wizard-<name>`).
    pub name: String,
    pub base_url: String,
    /// Behaviours applied to every step, before the step's own.
    pub behaviours: Vec<BehaviourSpec>,
    pub formatters: Vec<Formatter>,
    pub confirm_step: String,
    pub exit_step: String,
    pub save_and_exit_step: String,
    /// Free-form values exposed to every step's locals.
    pub app_config: Map<String, Value>,
    pub csrf: bool,
    /// Gate steps on visited prerequisites.
    pub check_journey: bool,
    /// Journey start; the first declared step when unset.
    pub start: Option<String>,
    pub secure_cookies: bool,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_url: "/".to_string(),
            behaviours: Vec::new(),
            formatters: Formatter::defaults(),
            confirm_step: "/confirm".to_string(),
            exit_step: "/exit".to_string(),
            save_and_exit_step: "/save-and-exit".to_string(),
            app_config: Map::new(),
            csrf: true,
            check_journey: true,
            start: None,
            secure_cookies: false,
        }
    }
}

impl WizardSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn session_key(&self) -> String {
        format!("{}{}", WIZARD_KEY_PREFIX, self.name)
    }

    pub fn start(&self) -> &str {
        self.start.as_deref().unwrap_or("/")
    }
}

/// Result of dispatching a request to a wizard.
#[derive(Debug)]
pub struct StepOutcome {
    pub response: StepResponse,
    pub cookies: Vec<ResponseCookie>,
}

pub struct Wizard {
    settings: Arc<WizardSettings>,
    graph: Arc<StepGraph>,
    steps: HashMap<String, Step>,
    session_key: String,
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("name", &self.settings.name)
            .field("routes", &self.graph.routes().collect::<Vec<_>>())
            .finish()
    }
}

impl Wizard {
    /// Builds a wizard with the base controller for every step.
    pub fn new(
        steps: StepGraph,
        fields: FieldMap,
        settings: WizardSettings,
        csrf_tokens: Arc<dyn CsrfTokens>,
    ) -> Result<Self, ConfigurationError> {
        Self::builder(steps, fields, settings)
            .csrf_tokens(csrf_tokens)
            .build()
    }

    pub fn builder(steps: StepGraph, fields: FieldMap, settings: WizardSettings) -> WizardBuilder {
        WizardBuilder {
            steps,
            fields,
            settings,
            controller: None,
            csrf_tokens: None,
        }
    }

    pub fn settings(&self) -> &WizardSettings {
        &self.settings
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Step routes in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.graph.routes()
    }

    pub fn step(&self, route: &str) -> Option<&Step> {
        self.steps.get(route)
    }

    /// The step serving `path`, either `<route>` or `<route>/edit`.
    pub fn resolve(&self, path: &str) -> Option<&Step> {
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        self.steps.get(path).or_else(|| {
            path.strip_suffix("/edit")
                .map(|route| if route.is_empty() { "/" } else { route })
                .and_then(|route| self.steps.get(route))
        })
    }

    /// Handles one request against the session.
    pub fn handle(
        &self,
        request: StepRequest,
        session: SessionHandle,
    ) -> Result<StepOutcome, WizardError> {
        let step = self
            .resolve(&request.path)
            .ok_or_else(|| WizardError::NotFound(request.path.clone()))?;

        let mut ctx = StepContext::new(request, step.route(), session, &self.session_key)
            .map_err(|e| WizardError::Internal(e.to_string()))?;
        let response = step.handle(&mut ctx)?;

        Ok(StepOutcome {
            response,
            cookies: ctx.response_cookies,
        })
    }
}

pub struct WizardBuilder {
    steps: StepGraph,
    fields: FieldMap,
    settings: WizardSettings,
    controller: Option<ControllerFactory>,
    csrf_tokens: Option<Arc<dyn CsrfTokens>>,
}

impl WizardBuilder {
    /// Replaces the base controller for every step.
    pub fn controller<F>(mut self, factory: F) -> Self
    where
        F: Fn(ControllerOptions) -> Box<dyn StepController> + Send + Sync + 'static,
    {
        self.controller = Some(Arc::new(factory));
        self
    }

    pub fn csrf_tokens(mut self, tokens: Arc<dyn CsrfTokens>) -> Self {
        self.csrf_tokens = Some(tokens);
        self
    }

    /// Resolves behaviours and assembles every step.
    ///
    /// # Errors
    ///
    /// Fails on an empty graph, an unknown start step, an unknown behaviour
    /// name, or when CSRF is enabled without a token generator.
    pub fn build(self) -> Result<Wizard, ConfigurationError> {
        let WizardBuilder {
            steps,
            fields,
            mut settings,
            controller,
            csrf_tokens,
        } = self;

        let first = steps.first().ok_or(ConfigurationError::NoSteps)?.to_string();
        let start = settings.start.get_or_insert(first).clone();
        if !steps.contains(&start) {
            return Err(ConfigurationError::UnknownStep(start));
        }
        let csrf_tokens = match (settings.csrf, csrf_tokens) {
            (true, None) => return Err(ConfigurationError::MissingCsrfTokens),
            (_, tokens) => tokens,
        };

        let session_key = settings.session_key();
        let settings = Arc::new(settings);
        let graph = Arc::new(steps);
        let fields = Arc::new(fields);
        let progress = Arc::new(CheckProgress);

        let mut mounted = HashMap::new();
        for (route, step_options) in graph.iter() {
            let options = ControllerOptions {
                route: route.to_string(),
                step: step_options.clone(),
                settings: Arc::clone(&settings),
                graph: Arc::clone(&graph),
                fields: Arc::clone(&fields),
            };
            let base: Box<dyn StepController> = match &controller {
                Some(factory) => factory(options),
                None => Box::new(BaseController::new(options)),
            };

            let behaviours: Vec<BehaviourSpec> = settings
                .behaviours
                .iter()
                .chain(step_options.behaviours.iter())
                .cloned()
                .collect();
            let composed = compose(base, &behaviours)?;

            let mut step = Step::new(composed)
                .with_middleware(Box::new(CheckSession))
                .with_middleware(Box::new(CheckComplete))
                .with_middleware(Box::new(CheckProgress));
            if let Some(tokens) = csrf_tokens.as_ref().filter(|_| settings.csrf) {
                step = step.with_middleware(Box::new(Csrf::new(Arc::clone(tokens))));
            }
            let step = step
                .with_middleware(Box::new(BackLinks))
                .on_complete(progress.clone());

            mounted.insert(route.to_string(), step);
        }

        tracing::info!(
            wizard = %settings.name,
            steps = mounted.len(),
            start = %start,
            "wizard built"
        );

        Ok(Wizard {
            settings,
            graph,
            steps: mounted,
            session_key,
        })
    }
}
