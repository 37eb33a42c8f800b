use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::spec::TemplateSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One problem found in a template definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateIssue {
    pub severity: Severity,
    pub code: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TemplateValidation {
    pub valid: bool,
    pub issues: Vec<TemplateIssue>,
}

impl TemplateValidation {
    pub fn errors(&self) -> impl Iterator<Item = &TemplateIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &TemplateIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }
}

/// Checks a template definition for structural problems.
///
/// Warnings are reported but do not make the template invalid.
pub fn validate_template(template: &TemplateSpec) -> TemplateValidation {
    let mut issues = Vec::new();

    if template.name.trim().is_empty() {
        issues.push(error("/name", "empty_name", "template name is required"));
    }
    if template.fields.is_empty() {
        issues.push(error("/fields", "no_fields", "at least one field is required"));
    }
    if template.steps.is_empty() {
        issues.push(warning(
            "/steps",
            "no_steps",
            "no steps defined; a single Details step will be used",
        ));
    }

    let mut seen = BTreeSet::new();
    for (index, field) in template.fields.iter().enumerate() {
        let path = format!("/fields/{}", index);
        if field.key.trim().is_empty() {
            issues.push(error(&path, "empty_key", "field key is required"));
        } else if !seen.insert(field.key.as_str()) {
            issues.push(error(
                &path,
                "duplicate_key",
                &format!("field key '{}' is defined more than once", field.key),
            ));
        }
        if field.label.trim().is_empty() {
            issues.push(error(
                &path,
                "empty_label",
                &format!("field '{}' needs a label", field.key),
            ));
        }
        if !field.options.is_empty() && !field.kind.is_choice() {
            issues.push(warning(
                &path,
                "unused_options",
                &format!(
                    "options on '{}' are ignored for {} fields",
                    field.key,
                    field.kind.as_str()
                ),
            ));
        }
    }

    let mut owners: BTreeMap<&str, usize> = BTreeMap::new();
    for (index, step) in template.steps.iter().enumerate() {
        let path = format!("/steps/{}", index);
        if step.step_title.trim().is_empty() {
            issues.push(error(&path, "empty_step_title", "step title is required"));
        }
        if step.field_keys.is_empty() {
            issues.push(error(
                &path,
                "empty_step",
                &format!("step '{}' lists no fields", step.step_title),
            ));
        }
        for key in &step.field_keys {
            if template.field(key).is_none() {
                issues.push(error(
                    &path,
                    "unknown_field",
                    &format!("step '{}' refers to unknown field '{}'", step.step_title, key),
                ));
                continue;
            }
            if let Some(first) = owners.insert(key.as_str(), index)
                && first != index
            {
                issues.push(error(
                    &path,
                    "duplicate_step_field",
                    &format!("field '{}' already appears in step {}", key, first),
                ));
            }
        }
    }

    TemplateValidation {
        valid: !issues.iter().any(|issue| issue.severity == Severity::Error),
        issues,
    }
}

fn error(path: &str, code: &str, message: &str) -> TemplateIssue {
    issue(Severity::Error, path, code, message)
}

fn warning(path: &str, code: &str, message: &str) -> TemplateIssue {
    issue(Severity::Warning, path, code, message)
}

fn issue(severity: Severity, path: &str, code: &str, message: &str) -> TemplateIssue {
    TemplateIssue {
        severity,
        code: code.into(),
        path: path.into(),
        message: message.into(),
    }
}
