use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use portal_spec::{
    CatalogError, Category, Role, Session, TemplateCatalog, TemplateKind, TemplateSource,
    TemplateSpec, Wizard, WizardError, WizardState, build_render_payload,
    render_json_ui as portal_render_json_ui, render_text as portal_render_text,
    validate_template as portal_validate_template, values_to_entry, values_to_task,
};

const DEFAULT_CATALOG: &str = include_str!("../../portal-spec/tests/fixtures/catalog.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse {0}: {1}")]
    Parse(&'static str, #[source] serde_json::Error),
    #[error("template {0} is not available")]
    TemplateUnavailable(u64),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    catalog_json: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Wizard session as it crosses the boundary.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionEnvelope {
    template_id: u64,
    #[serde(flatten)]
    state: WizardState,
}

fn load_config(config_json: &str) -> Result<ComponentConfig, ComponentError> {
    if config_json.trim().is_empty() {
        Ok(ComponentConfig::default())
    } else {
        serde_json::from_str(config_json).map_err(|err| ComponentError::Parse("config", err))
    }
}

fn load_catalog(config_json: &str) -> Result<TemplateCatalog, ComponentError> {
    let config = load_config(config_json)?;
    let catalog_json = config.catalog_json.as_deref().unwrap_or(DEFAULT_CATALOG);
    Ok(TemplateCatalog::from_json(catalog_json)?)
}

fn load_session(config_json: &str) -> Result<Session, ComponentError> {
    let config = load_config(config_json)?;
    Ok(Session::new(Role::resolve(config.role.as_deref())))
}

fn parse_values(values_json: &str) -> Map<String, Value> {
    serde_json::from_str::<Value>(values_json)
        .ok()
        .and_then(|value| value.as_object().cloned())
        .unwrap_or_default()
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn ensure_template(
    catalog: &TemplateCatalog,
    template_id: u64,
) -> Result<TemplateSpec, ComponentError> {
    catalog
        .get(template_id)
        .cloned()
        .ok_or(ComponentError::TemplateUnavailable(template_id))
}

fn restore(
    config_json: &str,
    session_json: &str,
) -> Result<(Wizard, Vec<Category>), ComponentError> {
    let envelope: SessionEnvelope =
        serde_json::from_str(session_json).map_err(|err| ComponentError::Parse("session", err))?;
    let catalog = load_catalog(config_json)?;
    let template = ensure_template(&catalog, envelope.template_id)?;
    let categories = catalog.fetch_categories()?;
    Ok((Wizard::restore(template, envelope.state), categories))
}

/// Session JSON plus the rendered UI, returned by every navigation call.
fn session_response(wizard: &Wizard, categories: &[Category], outcome: Value) -> Value {
    let payload = build_render_payload(wizard, categories, None);
    json!({
        "session": {
            "templateId": wizard.template().id,
            "stepIndex": wizard.step_index(),
            "values": wizard.values(),
            "error": wizard.error(),
            "saving": wizard.is_saving(),
        },
        "outcome": outcome,
        "ui": portal_render_json_ui(&payload),
    })
}

pub fn list_templates(config_json: &str, kind: &str) -> String {
    respond(load_catalog(config_json).and_then(|catalog| {
        let templates = catalog.fetch_templates(TemplateKind::from_label(kind))?;
        serde_json::to_value(templates).map_err(ComponentError::JsonEncode)
    }))
}

pub fn list_categories(config_json: &str) -> String {
    respond(load_catalog(config_json).and_then(|catalog| {
        serde_json::to_value(catalog.fetch_categories()?).map_err(ComponentError::JsonEncode)
    }))
}

pub fn describe(config_json: &str, template_id: u64) -> String {
    respond(load_catalog(config_json).and_then(|catalog| {
        let template = ensure_template(&catalog, template_id)?;
        serde_json::to_value(template).map_err(ComponentError::JsonEncode)
    }))
}

pub fn start(config_json: &str, template_id: u64, initial_json: &str) -> String {
    respond(load_catalog(config_json).and_then(|catalog| {
        let template = ensure_template(&catalog, template_id)?;
        let categories = catalog.fetch_categories()?;
        let initial = parse_values(initial_json);
        let initial = if initial.is_empty() { None } else { Some(initial) };
        let wizard = Wizard::new(template, initial);
        Ok(session_response(&wizard, &categories, json!("started")))
    }))
}

pub fn update_value(config_json: &str, session_json: &str, key: &str, value_json: &str) -> String {
    respond(restore(config_json, session_json).and_then(|(mut wizard, categories)| {
        let value: Value =
            serde_json::from_str(value_json).map_err(|err| ComponentError::Parse("value", err))?;
        wizard.update_value(key, value);
        Ok(session_response(&wizard, &categories, json!("updated")))
    }))
}

pub fn next(config_json: &str, session_json: &str) -> String {
    respond(restore(config_json, session_json).map(|(mut wizard, categories)| {
        let outcome = match wizard.next() {
            Ok(position) => json!({ "moved": true, "position": position }),
            Err(err) => {
                debug!(%err, "next refused");
                json!({ "moved": false, "reason": err.to_string() })
            }
        };
        session_response(&wizard, &categories, outcome)
    }))
}

pub fn back(config_json: &str, session_json: &str) -> String {
    respond(restore(config_json, session_json).map(|(mut wizard, categories)| {
        let position = wizard.back();
        session_response(&wizard, &categories, json!({ "moved": true, "position": position }))
    }))
}

pub fn jump_to(config_json: &str, session_json: &str, index: usize) -> String {
    respond(restore(config_json, session_json).and_then(|(mut wizard, categories)| {
        let position = wizard.jump_to(index)?;
        Ok(session_response(
            &wizard,
            &categories,
            json!({ "moved": true, "position": position }),
        ))
    }))
}

pub fn render_json_ui(config_json: &str, session_json: &str) -> String {
    respond(restore(config_json, session_json).map(|(wizard, categories)| {
        portal_render_json_ui(&build_render_payload(&wizard, &categories, None))
    }))
}

pub fn render_text(config_json: &str, session_json: &str) -> String {
    respond_string(restore(config_json, session_json).map(|(wizard, categories)| {
        portal_render_text(&build_render_payload(&wizard, &categories, None))
    }))
}

pub fn to_entry_payload(config_json: &str, values_json: &str) -> String {
    respond(load_catalog(config_json).and_then(|catalog| {
        let session = load_session(config_json)?;
        let categories = catalog.fetch_categories()?;
        let entry = values_to_entry(&parse_values(values_json), &categories, &session);
        serde_json::to_value(entry).map_err(ComponentError::JsonEncode)
    }))
}

pub fn to_task_payload(config_json: &str, values_json: &str) -> String {
    respond(load_catalog(config_json).and_then(|catalog| {
        let session = load_session(config_json)?;
        let categories = catalog.fetch_categories()?;
        let task = values_to_task(&parse_values(values_json), &categories, &session);
        serde_json::to_value(task).map_err(ComponentError::JsonEncode)
    }))
}

pub fn validate_template(template_json: &str) -> String {
    respond(
        serde_json::from_str::<TemplateSpec>(template_json)
            .map_err(|err| ComponentError::Parse("template", err))
            .and_then(|template| {
                serde_json::to_value(portal_validate_template(&template))
                    .map_err(ComponentError::JsonEncode)
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(response: &str) -> Value {
        serde_json::from_str(response).expect("json")
    }

    fn session_of(response: &Value) -> String {
        response["session"].to_string()
    }

    #[test]
    fn list_templates_filters_by_kind() {
        let parsed = parse(&list_templates("", "TASK"));
        let templates = parsed.as_array().expect("array");
        assert_eq!(templates.len(), 2);
        assert!(templates.iter().all(|template| template["type"] == "TASK"));

        let all = parse(&list_templates("", ""));
        assert_eq!(all.as_array().expect("array").len(), 4);
    }

    #[test]
    fn describe_returns_template_json() {
        let parsed = parse(&describe("", 1));
        assert_eq!(parsed["name"], "How-To Guide");
        assert_eq!(parsed["steps"][0]["fieldKeys"][0], "title");
    }

    #[test]
    fn describe_unknown_template_reports_error() {
        let parsed = parse(&describe("", 42));
        assert_eq!(parsed["error"], "template 42 is not available");
    }

    #[test]
    fn start_seeds_defaults_and_initial_values() {
        let parsed = parse(&start("", 3, r#"{"title":"Crash on save"}"#));
        assert_eq!(parsed["session"]["stepIndex"], 0);
        assert_eq!(parsed["session"]["values"]["title"], "Crash on save");
        assert_eq!(parsed["session"]["values"]["priority"], "MEDIUM");
        assert_eq!(parsed["session"]["values"]["stepsChecklist"], json!([]));
        assert_eq!(parsed["ui"]["body"]["title"], "Task Setup");
    }

    #[test]
    fn next_reports_missing_required_field() {
        let started = parse(&start("", 1, "{}"));
        let parsed = parse(&next("", &session_of(&started)));
        assert_eq!(parsed["outcome"]["moved"], false);
        assert_eq!(
            parsed["session"]["error"],
            "\"Title\" is required before continuing."
        );
        assert_eq!(parsed["session"]["stepIndex"], 0);
    }

    #[test]
    fn session_round_trips_through_updates() {
        let mut response = parse(&start("", 1, "{}"));
        for (key, value) in [
            ("title", r#""Deploy guide""#),
            ("shortDescription", r#""How we ship""#),
            ("categoryId", r#""3""#),
        ] {
            response = parse(&update_value("", &session_of(&response), key, value));
        }
        response = parse(&next("", &session_of(&response)));
        assert_eq!(response["outcome"]["moved"], true);
        assert_eq!(response["session"]["stepIndex"], 1);
        assert!(response["session"]["error"].is_null());

        response = parse(&back("", &session_of(&response)));
        assert_eq!(response["session"]["stepIndex"], 0);

        response = parse(&jump_to("", &session_of(&response), 3));
        assert_eq!(response["ui"]["body"]["kind"], "review");
    }

    #[test]
    fn jump_out_of_range_is_an_error() {
        let started = parse(&start("", 1, "{}"));
        let parsed = parse(&jump_to("", &session_of(&started), 9));
        assert_eq!(
            parsed["error"],
            "step 9 does not exist; the last step is 3"
        );
    }

    #[test]
    fn render_text_outputs_summary() {
        let started = parse(&start("", 2, "{}"));
        let output = render_text("", &session_of(&started));
        assert!(output.contains("Template: Reference Doc"));
        assert!(output.contains("== Document Info"));
    }

    #[test]
    fn entry_payload_uses_configured_role() {
        let config = json!({ "role": "Editor" }).to_string();
        let parsed = parse(&to_entry_payload(&config, r#"{"title":"Guide","tags":"a, b"}"#));
        assert_eq!(parsed["title"], "Guide");
        assert_eq!(parsed["tags"], json!(["a", "b"]));
        assert_eq!(parsed["createdBy"], "Editor");
        assert_eq!(parsed["categoryId"], 1);
    }

    #[test]
    fn task_payload_falls_back_to_viewer() {
        let parsed = parse(&to_task_payload("", r#"{"dueDate":"2024-06-30"}"#));
        assert_eq!(parsed["owner"], "Viewer");
        assert_eq!(parsed["dueDate"], "2024-06-30T00:00:00Z");
        assert_eq!(parsed["priority"], "MEDIUM");
    }

    #[test]
    fn custom_catalog_from_config() {
        let catalog = json!({
            "templates": [{
                "id": 7,
                "name": "Tiny",
                "type": "ENTRY",
                "fields": [{ "key": "title", "label": "Title", "type": "text" }]
            }],
            "categories": []
        });
        let config = json!({ "catalog_json": catalog.to_string() }).to_string();
        let parsed = parse(&start(&config, 7, ""));
        assert_eq!(parsed["ui"]["steps"][0]["title"], "Details");
        assert_eq!(parsed["ui"]["steps"][1]["title"], "Review");
    }

    #[test]
    fn validate_template_reports_issues() {
        let template = json!({
            "name": "Broken",
            "type": "ENTRY",
            "fields": [{ "key": "title", "label": "Title", "type": "text" }],
            "steps": [{ "stepTitle": "One", "fieldKeys": ["missing"] }]
        });
        let parsed = parse(&validate_template(&template.to_string()));
        assert_eq!(parsed["valid"], false);
        assert_eq!(parsed["issues"][0]["code"], "unknown_field");
    }
}
