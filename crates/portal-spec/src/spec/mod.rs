pub mod field;
pub mod template;

pub use field::{FieldOption, FieldSpec, FieldType};
pub use template::{Category, StepSpec, TemplateKind, TemplateSpec};
