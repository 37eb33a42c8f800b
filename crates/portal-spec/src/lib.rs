#![allow(missing_docs)]

pub mod catalog;
pub mod editor;
pub mod filter;
pub mod payload;
pub mod render;
pub mod session;
pub mod spec;
pub mod upload;
pub mod validate;
pub mod values;
pub mod wizard;

pub use catalog::{CatalogError, TemplateCatalog, TemplateSource};
pub use editor::{EditorError, EditorEvent, EditorView, apply_event, editor_for, field_options};
pub use filter::{EntryFilter, EntryRecord, TaskFilter, TaskRecord};
pub use payload::{EntryPayload, TaskPayload, values_to_entry, values_to_task};
pub use render::{RenderPayload, build_render_payload, render_json_ui, render_text};
pub use session::{AccessError, Role, Session};
pub use spec::{Category, FieldOption, FieldSpec, FieldType, StepSpec, TemplateKind, TemplateSpec};
pub use upload::{UploadEditor, UploadError, UploadFile, Uploader, upload_batch};
pub use validate::{TemplateIssue, TemplateValidation, validate_template};
pub use values::{
    ChecklistItem, WizardValues, default_value, initial_values, is_missing_value, value_as_array,
};
pub use wizard::{
    SubmitError, Wizard, WizardError, WizardHost, WizardPosition, WizardState, derive_steps,
};
