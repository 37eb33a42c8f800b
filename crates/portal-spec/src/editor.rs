use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::spec::{Category, FieldOption, FieldSpec, FieldType};
use crate::values::{
    self, ChecklistItem, checklist_from_value, checklist_to_value, date_for_display,
    number_from_input, text_for_display, value_as_array,
};

/// Field key whose select options come from the category list.
pub const CATEGORY_FIELD_KEY: &str = "categoryId";

pub const IMAGE_ACCEPT: &str = "image/png,image/jpeg,image/webp";
pub const FILE_ACCEPT: &str = "application/pdf,application/zip,application/x-zip-compressed";

/// Widget description for one field, independent of any drawing surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum EditorView {
    TextInput {
        value: String,
    },
    TextArea {
        value: String,
        rows: u8,
    },
    Select {
        placeholder: &'static str,
        options: Vec<FieldOption>,
        selected: String,
    },
    CheckboxGroup {
        options: Vec<ChoiceState>,
    },
    TagInput {
        placeholder: &'static str,
        text: String,
    },
    DateInput {
        value: String,
    },
    NumberInput {
        value: String,
    },
    Checkbox {
        caption: &'static str,
        checked: bool,
    },
    Checklist {
        items: Vec<ChecklistItem>,
    },
    LinkList {
        links: Vec<String>,
    },
    Upload {
        label: &'static str,
        accept: &'static str,
        urls: Vec<String>,
    },
}

/// One option of a checkbox group together with its checked state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceState {
    pub value: String,
    pub label: String,
    pub checked: bool,
}

/// User interaction with a field editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Raw text typed into a single input.
    Input(String),
    /// Single checkbox toggled.
    Toggle(bool),
    /// Option of a checkbox group toggled.
    ToggleOption { value: String, checked: bool },
    AddRow,
    /// New last row holding the given text.
    AppendRow(String),
    RemoveRow(usize),
    EditRow { index: usize, text: String },
    SetRowDone { index: usize, done: bool },
    /// URLs returned by a completed upload batch.
    AppendUrls(Vec<String>),
    RemoveUrl(String),
}

impl EditorEvent {
    fn name(&self) -> &'static str {
        match self {
            EditorEvent::Input(_) => "input",
            EditorEvent::Toggle(_) => "toggle",
            EditorEvent::ToggleOption { .. } => "toggle_option",
            EditorEvent::AddRow => "add_row",
            EditorEvent::AppendRow(_) => "append_row",
            EditorEvent::RemoveRow(_) => "remove_row",
            EditorEvent::EditRow { .. } => "edit_row",
            EditorEvent::SetRowDone { .. } => "set_row_done",
            EditorEvent::AppendUrls(_) => "append_urls",
            EditorEvent::RemoveUrl(_) => "remove_url",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("field '{key}' ({kind}) does not accept {event} events")]
    UnsupportedEvent {
        key: String,
        kind: &'static str,
        event: &'static str,
    },
    #[error("field '{key}' has no row {index}")]
    RowOutOfRange { key: String, index: usize },
}

/// Choice list for a select-like field.
///
/// `categoryId` fields list the categories instead of their static options when any exist.
pub fn field_options(field: &FieldSpec, categories: &[Category]) -> Vec<FieldOption> {
    if field.key == CATEGORY_FIELD_KEY && !categories.is_empty() {
        return categories
            .iter()
            .map(|category| FieldOption {
                value: category.id.to_string(),
                label: category.name.clone(),
            })
            .collect();
    }
    field.parsed_options()
}

/// Builds the editor for a field from its current value.
pub fn editor_for(field: &FieldSpec, value: Option<&Value>, categories: &[Category]) -> EditorView {
    let null = Value::Null;
    let current = value.unwrap_or(&null);
    match field.kind {
        FieldType::Text => EditorView::TextInput {
            value: text_for_display(value),
        },
        FieldType::Textarea => EditorView::TextArea {
            value: text_for_display(value),
            rows: 4,
        },
        FieldType::Richtext => EditorView::TextArea {
            value: text_for_display(value),
            rows: 8,
        },
        FieldType::Select => EditorView::Select {
            placeholder: "Select...",
            options: field_options(field, categories),
            selected: text_for_display(value),
        },
        FieldType::Multiselect => {
            let selected = value_as_array(current);
            EditorView::CheckboxGroup {
                options: field_options(field, categories)
                    .into_iter()
                    .map(|option| ChoiceState {
                        checked: selected.contains(&option.value),
                        value: option.value,
                        label: option.label,
                    })
                    .collect(),
            }
        }
        FieldType::Tags => EditorView::TagInput {
            placeholder: "tag1, tag2, tag3",
            text: value_as_array(current).join(", "),
        },
        FieldType::Date => EditorView::DateInput {
            value: date_for_display(current),
        },
        FieldType::Number => EditorView::NumberInput {
            value: text_for_display(value),
        },
        FieldType::Checkbox => EditorView::Checkbox {
            caption: "Enabled",
            checked: values::is_truthy(current),
        },
        FieldType::Checklist => EditorView::Checklist {
            items: checklist_from_value(current),
        },
        FieldType::Links => EditorView::LinkList {
            links: link_rows(current),
        },
        FieldType::ImageUpload => EditorView::Upload {
            label: "Images",
            accept: IMAGE_ACCEPT,
            urls: value_as_array(current),
        },
        FieldType::FileUpload => EditorView::Upload {
            label: "Files",
            accept: FILE_ACCEPT,
            urls: value_as_array(current),
        },
    }
}

/// Applies an editor event and returns the field's new value.
pub fn apply_event(
    field: &FieldSpec,
    current: Option<&Value>,
    event: EditorEvent,
) -> Result<Value, EditorError> {
    let null = Value::Null;
    let current = current.unwrap_or(&null);
    let unsupported = |event: &EditorEvent| EditorError::UnsupportedEvent {
        key: field.key.clone(),
        kind: field.kind.as_str(),
        event: event.name(),
    };

    match field.kind {
        FieldType::Text
        | FieldType::Textarea
        | FieldType::Richtext
        | FieldType::Select
        | FieldType::Date => match event {
            EditorEvent::Input(text) => Ok(Value::String(text)),
            other => Err(unsupported(&other)),
        },
        FieldType::Tags => match event {
            EditorEvent::Input(text) => Ok(strings_to_value(value_as_array(&Value::String(text)))),
            other => Err(unsupported(&other)),
        },
        FieldType::Number => match event {
            EditorEvent::Input(text) => Ok(number_from_input(&text)),
            other => Err(unsupported(&other)),
        },
        FieldType::Checkbox => match event {
            EditorEvent::Toggle(checked) => Ok(Value::Bool(checked)),
            other => Err(unsupported(&other)),
        },
        FieldType::Multiselect => match event {
            EditorEvent::ToggleOption { value, checked } => {
                let mut selected = value_as_array(current);
                if checked {
                    if !selected.contains(&value) {
                        selected.push(value);
                    }
                } else {
                    selected.retain(|item| item != &value);
                }
                Ok(strings_to_value(selected))
            }
            other => Err(unsupported(&other)),
        },
        FieldType::Checklist => {
            let mut items = checklist_from_value(current);
            match event {
                EditorEvent::AddRow => items.push(ChecklistItem::default()),
                EditorEvent::AppendRow(text) => items.push(ChecklistItem::new(text, false)),
                EditorEvent::RemoveRow(index) => {
                    row_in_range(field, index, items.len())?;
                    items.remove(index);
                }
                EditorEvent::EditRow { index, text } => {
                    row_in_range(field, index, items.len())?;
                    items[index].text = text;
                }
                EditorEvent::SetRowDone { index, done } => {
                    row_in_range(field, index, items.len())?;
                    items[index].done = done;
                }
                other => return Err(unsupported(&other)),
            }
            Ok(checklist_to_value(&items))
        }
        FieldType::Links => {
            let mut links = link_rows(current);
            match event {
                EditorEvent::AddRow => links.push(String::new()),
                EditorEvent::AppendRow(text) => links.push(text),
                EditorEvent::RemoveRow(index) => {
                    row_in_range(field, index, links.len())?;
                    links.remove(index);
                }
                EditorEvent::EditRow { index, text } => {
                    row_in_range(field, index, links.len())?;
                    links[index] = text;
                }
                other => return Err(unsupported(&other)),
            }
            Ok(strings_to_value(links))
        }
        FieldType::ImageUpload | FieldType::FileUpload => {
            let mut urls = value_as_array(current);
            match event {
                EditorEvent::AppendUrls(uploaded) => urls.extend(uploaded),
                EditorEvent::RemoveUrl(url) => urls.retain(|item| item != &url),
                other => return Err(unsupported(&other)),
            }
            Ok(strings_to_value(urls))
        }
    }
}

/// Link rows keep blank entries so a freshly added row stays editable.
fn link_rows(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| values::stringify(item).unwrap_or_default())
            .collect(),
        other => value_as_array(other),
    }
}

fn row_in_range(field: &FieldSpec, index: usize, len: usize) -> Result<(), EditorError> {
    if index < len {
        Ok(())
    } else {
        Err(EditorError::RowOutOfRange {
            key: field.key.clone(),
            index,
        })
    }
}

fn strings_to_value(items: Vec<String>) -> Value {
    Value::Array(items.into_iter().map(Value::String).collect())
}
