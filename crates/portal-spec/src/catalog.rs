use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::session::{AccessError, Session};
use crate::spec::{Category, TemplateKind, TemplateSpec};
use crate::validate::{TemplateIssue, validate_template};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Forbidden(#[from] AccessError),
    #[error("template {0} not found")]
    NotFound(u64),
    #[error("template is invalid: {}", summarize(.0))]
    Invalid(Vec<TemplateIssue>),
    #[error("failed to parse catalog: {0}")]
    Parse(#[source] serde_json::Error),
}

fn summarize(issues: &[TemplateIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{} ({})", issue.message, issue.path))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Supplies templates and categories to wizard callers.
pub trait TemplateSource {
    fn fetch_templates(&self, kind: Option<TemplateKind>)
    -> Result<Vec<TemplateSpec>, CatalogError>;

    fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError>;
}

/// In-memory template store, loadable from `{ "templates": [...], "categories": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateCatalog {
    #[serde(default)]
    templates: Vec<TemplateSpec>,
    #[serde(default)]
    categories: Vec<Category>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<TemplateSpec>, categories: Vec<Category>) -> Self {
        let mut catalog = Self {
            templates,
            categories,
        };
        catalog.assign_missing_ids();
        catalog
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: TemplateCatalog = serde_json::from_str(json).map_err(CatalogError::Parse)?;
        Ok(Self::new(catalog.templates, catalog.categories))
    }

    pub fn get(&self, id: u64) -> Option<&TemplateSpec> {
        self.templates.iter().find(|template| template.id == id)
    }

    /// Stores a new template under a fresh id. Admin only.
    pub fn create_template(
        &mut self,
        session: &Session,
        mut draft: TemplateSpec,
    ) -> Result<&TemplateSpec, CatalogError> {
        session.require(Session::TEMPLATE_ADMINS, "create templates")?;
        ensure_valid(&draft)?;
        draft.id = self.next_id();
        info!(template_id = draft.id, name = %draft.name, "template created");
        self.templates.push(draft);
        let index = self.templates.len() - 1;
        Ok(&self.templates[index])
    }

    /// Replaces the template with the given id. Admin only.
    pub fn update_template(
        &mut self,
        session: &Session,
        id: u64,
        mut draft: TemplateSpec,
    ) -> Result<&TemplateSpec, CatalogError> {
        session.require(Session::TEMPLATE_ADMINS, "edit templates")?;
        ensure_valid(&draft)?;
        let slot = self
            .templates
            .iter_mut()
            .find(|template| template.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        draft.id = id;
        *slot = draft;
        info!(template_id = id, "template updated");
        Ok(slot)
    }

    /// Removes a template. Admin only.
    pub fn delete_template(&mut self, session: &Session, id: u64) -> Result<(), CatalogError> {
        session.require(Session::TEMPLATE_ADMINS, "delete templates")?;
        let before = self.templates.len();
        self.templates.retain(|template| template.id != id);
        if self.templates.len() == before {
            return Err(CatalogError::NotFound(id));
        }
        info!(template_id = id, "template deleted");
        Ok(())
    }

    fn next_id(&self) -> u64 {
        self.templates
            .iter()
            .map(|template| template.id)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn assign_missing_ids(&mut self) {
        let mut next = self.next_id();
        for template in self.templates.iter_mut().filter(|template| template.id == 0) {
            template.id = next;
            next += 1;
        }
    }
}

impl TemplateSource for TemplateCatalog {
    /// ENTRY templates before TASK templates, newest first within a kind.
    fn fetch_templates(
        &self,
        kind: Option<TemplateKind>,
    ) -> Result<Vec<TemplateSpec>, CatalogError> {
        let mut templates = self
            .templates
            .iter()
            .filter(|template| kind.is_none_or(|kind| template.kind == kind))
            .cloned()
            .collect::<Vec<_>>();
        templates.sort_by_key(|template| (template.kind, Reverse(template.id)));
        Ok(templates)
    }

    fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let mut categories = self.categories.clone();
        categories.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(categories)
    }
}

fn ensure_valid(template: &TemplateSpec) -> Result<(), CatalogError> {
    let validation = validate_template(template);
    if validation.valid {
        Ok(())
    } else {
        Err(CatalogError::Invalid(validation.errors().cloned().collect()))
    }
}
