use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::editor::{self, EditorError, EditorEvent};
use crate::spec::{FieldSpec, StepSpec, TemplateSpec};
use crate::values::{WizardValues, initial_values, is_missing_value};

pub const DETAILS_STEP_TITLE: &str = "Details";
pub const REVIEW_STEP_TITLE: &str = "Review";
pub const SAVE_FAILED: &str = "Save failed";

/// Where a wizard session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum WizardPosition {
    Step(usize),
    Review,
}

impl fmt::Display for WizardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardPosition::Step(index) => write!(f, "step {}", index),
            WizardPosition::Review => f.write_str("review"),
        }
    }
}

/// Mutable session state; serializable so a host can hold it between calls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub step_index: usize,
    pub values: WizardValues,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub saving: bool,
}

/// Rejection reported by a host's submit callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Rejected(String),
    #[error("{}", SAVE_FAILED)]
    Unspecified,
}

impl SubmitError {
    /// Message shown to the user; blank rejections fall back to the generic one.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Rejected(message) if !message.trim().is_empty() => message.clone(),
            _ => SAVE_FAILED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("\"{label}\" is required before continuing.")]
    MissingRequired { key: String, label: String },
    #[error("{action} is not available on {position}")]
    InvalidTransition {
        action: &'static str,
        position: WizardPosition,
    },
    #[error("step {index} does not exist; the last step is {last}")]
    StepOutOfRange { index: usize, last: usize },
    #[error("a submit is already in flight")]
    AlreadySaving,
    #[error("{0}")]
    SubmitRejected(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error(transparent)]
    Editor(#[from] EditorError),
}

/// Callbacks a wizard hands control to.
pub trait WizardHost {
    /// Persists the completed values. `Ok` means the caller takes over the session.
    fn submit(&mut self, values: &WizardValues) -> Result<(), SubmitError>;

    fn cancel(&mut self) {}
}

/// Steps as presented: declared steps, or one implicit "Details" step holding every field.
///
/// The Review pseudo-step is not included; its index is the returned length.
pub fn derive_steps(template: &TemplateSpec) -> Vec<StepSpec> {
    if !template.steps.is_empty() {
        return template.steps.clone();
    }
    vec![StepSpec {
        step_title: DETAILS_STEP_TITLE.to_string(),
        step_description: Some(String::new()),
        field_keys: template.fields.iter().map(|field| field.key.clone()).collect(),
    }]
}

/// One form-filling session against one template.
#[derive(Debug, Clone)]
pub struct Wizard {
    template: TemplateSpec,
    initial: Option<WizardValues>,
    steps: Vec<StepSpec>,
    state: WizardState,
}

impl Wizard {
    pub fn new(template: TemplateSpec, initial: Option<WizardValues>) -> Self {
        let steps = derive_steps(&template);
        let values = initial_values(&template, initial.as_ref());
        debug!(template_id = template.id, steps = steps.len(), "wizard started");
        Self {
            template,
            initial,
            steps,
            state: WizardState {
                step_index: 0,
                values,
                error: None,
                saving: false,
            },
        }
    }

    /// Resumes a session from previously serialized state.
    pub fn restore(template: TemplateSpec, mut state: WizardState) -> Self {
        let steps = derive_steps(&template);
        state.step_index = state.step_index.min(steps.len());
        Self {
            template,
            initial: None,
            steps,
            state,
        }
    }

    /// Switches to another template or initial value set, resetting the session if either changed.
    ///
    /// Returns whether a reset happened.
    pub fn load(&mut self, template: TemplateSpec, initial: Option<WizardValues>) -> bool {
        if template == self.template && initial == self.initial {
            return false;
        }
        *self = Wizard::new(template, initial);
        true
    }

    pub fn template(&self) -> &TemplateSpec {
        &self.template
    }

    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn values(&self) -> &WizardValues {
        &self.state.values
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.state.values.get(key)
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.state.saving
    }

    pub fn step_index(&self) -> usize {
        self.state.step_index
    }

    pub fn review_index(&self) -> usize {
        self.steps.len()
    }

    pub fn is_review(&self) -> bool {
        self.state.step_index == self.review_index()
    }

    pub fn position(&self) -> WizardPosition {
        if self.is_review() {
            WizardPosition::Review
        } else {
            WizardPosition::Step(self.state.step_index)
        }
    }

    pub fn current_step(&self) -> Option<&StepSpec> {
        if self.is_review() {
            None
        } else {
            self.steps.get(self.state.step_index)
        }
    }

    /// Fields of the current step; keys that do not resolve are skipped.
    pub fn current_fields(&self) -> Vec<&FieldSpec> {
        self.current_step()
            .map(|step| {
                step.field_keys
                    .iter()
                    .filter_map(|key| self.template.field(key))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Merges one value into the map. Does not validate or move.
    pub fn update_value(&mut self, key: impl Into<String>, value: Value) {
        self.state.values.insert(key.into(), value);
    }

    /// Routes an editor event through the field's editor and stores the result.
    pub fn apply_event(&mut self, key: &str, event: EditorEvent) -> Result<(), WizardError> {
        let field = self
            .template
            .field(key)
            .ok_or_else(|| WizardError::UnknownField(key.to_string()))?;
        let value = editor::apply_event(field, self.state.values.get(key), event)?;
        self.state.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Checks required fields of the current step in declared order, stopping at the first gap.
    pub fn validate_current_step(&mut self) -> Result<(), WizardError> {
        let Some(step) = self.current_step() else {
            return Ok(());
        };
        let missing = step
            .field_keys
            .iter()
            .filter_map(|key| self.template.field(key))
            .find(|field| field.required && is_missing_value(self.state.values.get(&field.key)))
            .map(|field| (field.key.clone(), field.label.clone()));

        match missing {
            Some((key, label)) => {
                let error = WizardError::MissingRequired { key, label };
                self.state.error = Some(error.to_string());
                Err(error)
            }
            None => {
                self.state.error = None;
                Ok(())
            }
        }
    }

    /// Validates the current step and advances, possibly onto Review.
    pub fn next(&mut self) -> Result<WizardPosition, WizardError> {
        if self.is_review() {
            return Err(WizardError::InvalidTransition {
                action: "next",
                position: WizardPosition::Review,
            });
        }
        if let Err(err) = self.validate_current_step() {
            debug!(
                template_id = self.template.id,
                step = self.state.step_index,
                %err,
                "step incomplete"
            );
            return Err(err);
        }
        self.state.step_index = (self.state.step_index + 1).min(self.review_index());
        debug!(template_id = self.template.id, position = %self.position(), "advanced");
        Ok(self.position())
    }

    /// Moves one step back, clamped at the first step. Clears the error.
    pub fn back(&mut self) -> WizardPosition {
        self.state.error = None;
        self.state.step_index = self.state.step_index.saturating_sub(1);
        self.position()
    }

    /// Free navigation through the progress indicators; never validates.
    pub fn jump_to(&mut self, index: usize) -> Result<WizardPosition, WizardError> {
        let last = self.review_index();
        if index > last {
            return Err(WizardError::StepOutOfRange { index, last });
        }
        self.state.step_index = index;
        Ok(self.position())
    }

    /// Marks a submit as in flight and hands out the values to persist.
    pub fn begin_submit(&mut self) -> Result<WizardValues, WizardError> {
        if !self.is_review() {
            return Err(WizardError::InvalidTransition {
                action: "submit",
                position: self.position(),
            });
        }
        if self.state.saving {
            return Err(WizardError::AlreadySaving);
        }
        self.state.saving = true;
        self.state.error = None;
        Ok(self.state.values.clone())
    }

    /// Records the outcome of the in-flight submit.
    pub fn finish_submit(&mut self, outcome: Result<(), SubmitError>) -> Result<(), WizardError> {
        self.state.saving = false;
        match outcome {
            Ok(()) => {
                info!(template_id = self.template.id, "wizard submitted");
                Ok(())
            }
            Err(err) => {
                let message = err.user_message();
                warn!(template_id = self.template.id, %message, "submit rejected");
                self.state.error = Some(message.clone());
                Err(WizardError::SubmitRejected(message))
            }
        }
    }

    pub fn submit<H: WizardHost + ?Sized>(&mut self, host: &mut H) -> Result<(), WizardError> {
        let values = self.begin_submit()?;
        let outcome = host.submit(&values);
        self.finish_submit(outcome)
    }

    pub fn cancel<H: WizardHost + ?Sized>(&self, host: &mut H) {
        debug!(template_id = self.template.id, "wizard cancelled");
        host.cancel();
    }

    pub fn into_state(self) -> WizardState {
        self.state
    }
}
