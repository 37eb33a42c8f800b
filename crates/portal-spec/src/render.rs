use serde_json::{Map, Value, json};

use crate::editor::{EditorView, editor_for};
use crate::spec::{Category, FieldType};
use crate::wizard::{REVIEW_STEP_TITLE, Wizard};

pub const DEFAULT_STEP_DESCRIPTION: &str = "Complete required fields to continue.";
pub const DEFAULT_SUBMIT_LABEL: &str = "Save";

/// Progress bar entry; the last indicator is always Review.
#[derive(Debug, Clone)]
pub struct StepIndicator {
    pub index: usize,
    pub title: String,
    pub active: bool,
    pub complete: bool,
}

/// One field of the current step with its editor.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub key: String,
    pub label: String,
    pub kind: FieldType,
    pub required: bool,
    pub help_text: Option<String>,
    pub editor: EditorView,
}

/// One line of the review summary.
#[derive(Debug, Clone)]
pub struct SummaryItem {
    pub key: String,
    pub label: String,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub enum RenderBody {
    Step {
        title: String,
        description: String,
        fields: Vec<RenderField>,
    },
    Review {
        summary: Vec<SummaryItem>,
    },
}

/// Enabled state of the wizard's buttons.
#[derive(Debug, Clone)]
pub struct RenderActions {
    pub back_enabled: bool,
    pub next_enabled: bool,
    pub submit_enabled: bool,
    pub submit_label: String,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub template_id: u64,
    pub template_name: String,
    pub description: String,
    pub step_index: usize,
    pub indicators: Vec<StepIndicator>,
    pub body: RenderBody,
    pub error: Option<String>,
    pub saving: bool,
    pub actions: RenderActions,
}

/// Build the renderer payload from a wizard session.
pub fn build_render_payload(
    wizard: &Wizard,
    categories: &[Category],
    submit_label: Option<&str>,
) -> RenderPayload {
    let template = wizard.template();
    let step_index = wizard.step_index();
    let saving = wizard.is_saving();

    let mut indicators = wizard
        .steps()
        .iter()
        .enumerate()
        .map(|(index, step)| StepIndicator {
            index,
            title: step.step_title.clone(),
            active: index == step_index,
            complete: index < step_index,
        })
        .collect::<Vec<_>>();
    indicators.push(StepIndicator {
        index: wizard.review_index(),
        title: REVIEW_STEP_TITLE.to_string(),
        active: wizard.is_review(),
        complete: false,
    });

    let body = match wizard.current_step() {
        Some(step) => RenderBody::Step {
            title: step.step_title.clone(),
            description: step
                .step_description
                .clone()
                .filter(|description| !description.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STEP_DESCRIPTION.to_string()),
            fields: wizard
                .current_fields()
                .into_iter()
                .map(|field| RenderField {
                    key: field.key.clone(),
                    label: field.label.clone(),
                    kind: field.kind,
                    required: field.required,
                    help_text: field.help_text.clone(),
                    editor: editor_for(field, wizard.value(&field.key), categories),
                })
                .collect(),
        },
        None => RenderBody::Review {
            summary: template
                .fields
                .iter()
                .map(|field| SummaryItem {
                    key: field.key.clone(),
                    label: field.label.clone(),
                    value: wizard.value(&field.key).cloned().unwrap_or(Value::Null),
                })
                .collect(),
        },
    };

    let submit_label = if saving {
        "Saving...".to_string()
    } else {
        submit_label.unwrap_or(DEFAULT_SUBMIT_LABEL).to_string()
    };

    RenderPayload {
        template_id: template.id,
        template_name: template.name.clone(),
        description: template.description.clone(),
        step_index,
        indicators,
        body,
        error: wizard.error().map(String::from),
        saving,
        actions: RenderActions {
            back_enabled: step_index > 0 && !saving,
            next_enabled: !wizard.is_review() && !saving,
            submit_enabled: wizard.is_review() && !saving,
            submit_label,
        },
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let indicators = payload
        .indicators
        .iter()
        .map(|indicator| {
            json!({
                "index": indicator.index,
                "title": indicator.title,
                "active": indicator.active,
                "complete": indicator.complete,
            })
        })
        .collect::<Vec<_>>();

    let body = match &payload.body {
        RenderBody::Step {
            title,
            description,
            fields,
        } => {
            let fields = fields
                .iter()
                .map(|field| {
                    let mut map = Map::new();
                    map.insert("key".into(), Value::String(field.key.clone()));
                    map.insert("label".into(), Value::String(field.label.clone()));
                    map.insert("type".into(), Value::String(field.kind.as_str().into()));
                    map.insert("required".into(), Value::Bool(field.required));
                    if let Some(help) = &field.help_text {
                        map.insert("help_text".into(), Value::String(help.clone()));
                    }
                    map.insert(
                        "editor".into(),
                        serde_json::to_value(&field.editor).unwrap_or(Value::Null),
                    );
                    Value::Object(map)
                })
                .collect::<Vec<_>>();
            json!({
                "kind": "step",
                "title": title,
                "description": description,
                "fields": fields,
            })
        }
        RenderBody::Review { summary } => {
            let summary = summary
                .iter()
                .map(|item| {
                    json!({
                        "key": item.key,
                        "label": item.label,
                        "value": item.value,
                    })
                })
                .collect::<Vec<_>>();
            json!({
                "kind": "review",
                "title": "Review Summary",
                "summary": summary,
            })
        }
    };

    json!({
        "template_id": payload.template_id,
        "template_name": payload.template_name,
        "description": payload.description,
        "step_index": payload.step_index,
        "steps": indicators,
        "body": body,
        "error": payload.error,
        "saving": payload.saving,
        "actions": {
            "back": payload.actions.back_enabled,
            "next": payload.actions.next_enabled,
            "submit": payload.actions.submit_enabled,
            "submit_label": payload.actions.submit_label,
        },
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Template: {}", payload.template_name));
    if !payload.description.is_empty() {
        lines.push(payload.description.clone());
    }

    let progress = payload
        .indicators
        .iter()
        .map(|indicator| {
            let marker = if indicator.active {
                ">"
            } else if indicator.complete {
                "x"
            } else {
                " "
            };
            format!("[{}] {}. {}", marker, indicator.index + 1, indicator.title)
        })
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(progress);

    match &payload.body {
        RenderBody::Step {
            title,
            description,
            fields,
        } => {
            lines.push(format!("== {}", title));
            lines.push(description.clone());
            for (position, field) in fields.iter().enumerate() {
                let mut entry = format!(" {}) {}", position + 1, field.label);
                if field.required {
                    entry.push_str(" *");
                }
                entry.push_str(&format!(" [{}]", field.kind.as_str()));
                entry.push_str(&format!(" = {}", editor_to_display(&field.editor)));
                lines.push(entry);
                if let Some(help) = &field.help_text {
                    lines.push(format!("    {}", help));
                }
            }
        }
        RenderBody::Review { summary } => {
            lines.push("== Review Summary".to_string());
            for item in summary {
                let pretty =
                    serde_json::to_string_pretty(&item.value).unwrap_or_else(|_| "null".into());
                lines.push(format!(" - {}: {}", item.label, pretty));
            }
        }
    }

    if let Some(error) = &payload.error {
        lines.push(format!("Error: {}", error));
    }
    if payload.saving {
        lines.push("Saving...".to_string());
    }

    lines.join("\n")
}

fn editor_to_display(editor: &EditorView) -> String {
    match editor {
        EditorView::TextInput { value }
        | EditorView::TextArea { value, .. }
        | EditorView::DateInput { value }
        | EditorView::NumberInput { value } => value.clone(),
        EditorView::Select {
            options, selected, ..
        } => {
            let choices = options
                .iter()
                .map(|option| {
                    if &option.value == selected {
                        format!("({})", option.label)
                    } else {
                        option.label.clone()
                    }
                })
                .collect::<Vec<_>>();
            if choices.is_empty() {
                selected.clone()
            } else {
                choices.join(" / ")
            }
        }
        EditorView::CheckboxGroup { options } => options
            .iter()
            .map(|option| {
                format!(
                    "[{}] {}",
                    if option.checked { "x" } else { " " },
                    option.label
                )
            })
            .collect::<Vec<_>>()
            .join(" "),
        EditorView::TagInput { text, .. } => text.clone(),
        EditorView::Checkbox { checked: true, .. } => "yes".to_string(),
        EditorView::Checkbox { checked: false, .. } => "no".to_string(),
        EditorView::Checklist { items } => items
            .iter()
            .map(|item| format!("[{}] {}", if item.done { "x" } else { " " }, item.text))
            .collect::<Vec<_>>()
            .join(", "),
        EditorView::LinkList { links } => links.join(", "),
        EditorView::Upload { urls, .. } => urls.join(", "),
    }
}
