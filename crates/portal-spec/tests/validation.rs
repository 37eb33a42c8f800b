use serde_json::json;

use portal_spec::validate::Severity;
use portal_spec::{FieldSpec, FieldType, StepSpec, TemplateKind, TemplateSpec, validate_template};

fn make_template() -> TemplateSpec {
    TemplateSpec {
        id: 0,
        name: "Simple".into(),
        kind: TemplateKind::Entry,
        description: "Simple entry".into(),
        steps: vec![StepSpec::new("Basics", ["title", "status"])],
        fields: vec![
            FieldSpec::new("title", "Title", FieldType::Text).required(),
            FieldSpec::new("status", "Status", FieldType::Select)
                .with_options(["DRAFT", "PUBLISHED"])
                .with_default(json!("DRAFT")),
        ],
    }
}

fn codes(template: &TemplateSpec) -> Vec<String> {
    validate_template(template)
        .issues
        .into_iter()
        .map(|issue| issue.code)
        .collect()
}

#[test]
fn well_formed_template_is_valid() {
    let result = validate_template(&make_template());
    assert!(result.valid);
    assert!(result.issues.is_empty());
}

#[test]
fn duplicate_keys_are_reported() {
    let mut template = make_template();
    template
        .fields
        .push(FieldSpec::new("title", "Again", FieldType::Text));
    let result = validate_template(&template);
    assert!(!result.valid);
    assert_eq!(result.issues[0].code, "duplicate_key");
    assert_eq!(result.issues[0].path, "/fields/2");
}

#[test]
fn steps_must_resolve_and_not_overlap() {
    let mut template = make_template();
    template.steps.push(StepSpec::new("More", ["title", "ghost"]));
    template.steps.push(StepSpec::new("Empty", Vec::<String>::new()));
    assert_eq!(
        codes(&template),
        vec!["duplicate_step_field", "unknown_field", "empty_step"]
    );
}

#[test]
fn warnings_do_not_invalidate() {
    let mut template = make_template();
    template.steps.clear();
    template.fields[0].options = vec!["ignored".into()];
    let result = validate_template(&template);
    assert!(result.valid);
    assert_eq!(result.warnings().count(), 2);
    assert!(result.issues.iter().all(|issue| issue.severity == Severity::Warning));
}

#[test]
fn template_json_uses_camel_case() {
    let template: TemplateSpec = serde_json::from_value(json!({
        "name": "Note",
        "type": "TASK",
        "fields": [
            { "key": "files", "label": "Files", "type": "fileUpload", "helpText": "PDF only" }
        ],
        "steps": [
            { "stepTitle": "Only", "fieldKeys": ["files"] }
        ]
    }))
    .expect("deserialize");
    assert_eq!(template.kind, TemplateKind::Task);
    assert_eq!(template.fields[0].kind, FieldType::FileUpload);
    assert!(!template.fields[0].required);
    assert_eq!(template.fields[0].help_text.as_deref(), Some("PDF only"));
    assert!(validate_template(&template).valid);
}
