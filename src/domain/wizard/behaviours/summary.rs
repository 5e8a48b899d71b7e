use serde_json::{json, Map, Value};

use crate::domain::wizard::context::StepContext;
use crate::domain::wizard::controller::StepController;

use super::Behaviour;

/// Adds `rows` to the locals: one entry per visited step, in graph order,
/// listing the step's answered fields and a link back to edit them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Summary;

impl Behaviour for Summary {
    fn name(&self) -> &str {
        "summary"
    }

    fn locals(&self, ctx: &StepContext, inner: &dyn StepController) -> Map<String, Value> {
        let mut locals = inner.locals(ctx);
        let visited = ctx.session_model.steps();
        let graph = &inner.options().graph;

        let rows: Vec<Value> = graph
            .iter()
            .filter(|(route, _)| visited.iter().any(|v| v.as_str() == *route))
            .filter_map(|(route, step)| {
                let fields: Vec<Value> = step
                    .fields
                    .iter()
                    .filter_map(|field| {
                        let value = ctx.session_model.get(field)?;
                        if is_blank(value) {
                            return None;
                        }
                        Some(json!({ "field": field, "value": value }))
                    })
                    .collect();
                if fields.is_empty() {
                    return None;
                }
                Some(json!({
                    "step": route,
                    "fields": fields,
                    "changeLink": ctx.url_for(&format!("{}/edit", route)),
                }))
            })
            .collect();

        locals.insert("rows".into(), Value::Array(rows));
        locals
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::wizard::context::StepRequest;
    use crate::domain::wizard::controller::{BaseController, ControllerOptions};
    use crate::domain::wizard::fields::FieldMap;
    use crate::domain::wizard::graph::{StepGraph, StepOptions};
    use crate::domain::wizard::session::Session;
    use crate::domain::wizard::wizard::WizardSettings;

    #[test]
    fn rows_follow_graph_order_and_skip_blank_values() {
        let graph = StepGraph::new()
            .step("/name", StepOptions::new().next("/age").fields(["name"]))
            .step("/age", StepOptions::new().next("/skipped").fields(["age"]))
            .step("/skipped", StepOptions::new().next("/confirm").fields(["pet"]))
            .step("/confirm", StepOptions::new());
        let inner = BaseController::new(ControllerOptions {
            route: "/confirm".into(),
            step: StepOptions::new(),
            settings: Arc::new(WizardSettings::default()),
            graph: Arc::new(graph),
            fields: Arc::new(FieldMap::new()),
        });
        let mut ctx = StepContext::new(
            StepRequest::get("/confirm").with_base_url("/apply"),
            "/confirm",
            Session::fresh().into_handle(),
            "hof-wizard-test",
        )
        .unwrap();
        ctx.session_model.set("name", "Jo");
        ctx.session_model.set("age", "");
        ctx.session_model.set("pet", "cat");
        ctx.session_model
            .set_steps(vec!["/age".into(), "/name".into()]);

        let locals = Summary.locals(&ctx, &inner);

        assert_eq!(
            locals["rows"],
            json!([{
                "step": "/name",
                "fields": [{ "field": "name", "value": "Jo" }],
                "changeLink": "/apply/name/edit",
            }])
        );
    }
}
