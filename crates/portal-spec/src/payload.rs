//! Converts completed wizard values into entry and task creation payloads.
//!
//! Mapping is total: blank or malformed values fall back to defaults instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::Session;
use crate::spec::Category;
use crate::values::{
    ChecklistItem, WizardValues, checklist_from_value, coerce_id, is_truthy, stringify,
    value_as_array, value_as_id_array,
};

pub const UNTITLED_ENTRY: &str = "Untitled Entry";
pub const UNTITLED_TASK: &str = "Untitled Task";
pub const FALLBACK_CATEGORY_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl EntryStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "DRAFT" => Some(EntryStatus::Draft),
            "PUBLISHED" => Some(EntryStatus::Published),
            "ARCHIVED" => Some(EntryStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "LOW" => Some(TaskPriority::Low),
            "MEDIUM" => Some(TaskPriority::Medium),
            "HIGH" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Archived,
}

impl TaskStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "TODO" => Some(TaskStatus::Todo),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "DONE" => Some(TaskStatus::Done),
            "ARCHIVED" => Some(TaskStatus::Archived),
            _ => None,
        }
    }
}

/// Library entry creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub category_id: i64,
    pub tags: Vec<String>,
    pub status: EntryStatus,
    pub cover_image_url: Option<String>,
    pub gallery_image_urls: Vec<String>,
    pub attachment_urls: Vec<String>,
    pub link_urls: Vec<String>,
    pub created_by: String,
    pub updated_by: String,
}

/// Task card creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub title: String,
    pub objective: String,
    pub steps_checklist: Vec<ChecklistItem>,
    pub owner: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub category_id: i64,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub attachment_urls: Vec<String>,
    pub notes: Option<String>,
    pub related_entry_ids: Vec<i64>,
    pub created_by: String,
    pub updated_by: String,
}

pub fn values_to_entry(
    values: &WizardValues,
    categories: &[Category],
    session: &Session,
) -> EntryPayload {
    let role = session.role.as_str();
    EntryPayload {
        title: text_or(values, "title", UNTITLED_ENTRY),
        short_description: text_or(values, "shortDescription", ""),
        full_description: text_or(values, "fullDescription", ""),
        category_id: category_id(values, categories),
        tags: list(values, "tags"),
        status: EntryStatus::from_label(&text_or(values, "status", "DRAFT")).unwrap_or_default(),
        cover_image_url: cover_image(values.get("coverImageUrl")),
        gallery_image_urls: list(values, "galleryImageUrls"),
        attachment_urls: list(values, "attachmentUrls"),
        link_urls: list(values, "linkUrls"),
        created_by: text_or(values, "createdBy", role),
        updated_by: text_or(values, "updatedBy", role),
    }
}

pub fn values_to_task(
    values: &WizardValues,
    categories: &[Category],
    session: &Session,
) -> TaskPayload {
    let role = session.role.as_str();
    TaskPayload {
        title: text_or(values, "title", UNTITLED_TASK),
        objective: text_or(values, "objective", ""),
        steps_checklist: values
            .get("stepsChecklist")
            .map(checklist_from_value)
            .unwrap_or_default(),
        owner: text_or(values, "owner", role),
        due_date: values.get("dueDate").and_then(parse_due_date),
        priority: TaskPriority::from_label(&text_or(values, "priority", "MEDIUM"))
            .unwrap_or_default(),
        status: TaskStatus::from_label(&text_or(values, "status", "TODO")).unwrap_or_default(),
        category_id: category_id(values, categories),
        tags: list(values, "tags"),
        image_urls: list(values, "imageUrls"),
        attachment_urls: list(values, "attachmentUrls"),
        notes: values
            .get("notes")
            .filter(|notes| is_truthy(notes))
            .and_then(stringify),
        related_entry_ids: values
            .get("relatedEntryIds")
            .filter(|ids| ids.is_array())
            .map(value_as_id_array)
            .unwrap_or_default(),
        created_by: text_or(values, "createdBy", role),
        updated_by: text_or(values, "updatedBy", role),
    }
}

/// Converts a date-only (or full timestamp) string to a UTC timestamp.
///
/// Date-only values map to midnight UTC; unparseable or blank values are `None`.
pub fn parse_due_date(value: &Value) -> Option<DateTime<Utc>> {
    if !is_truthy(value) {
        return None;
    }
    let text = stringify(value)?;
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// First category id (when non-zero), else `1`.
pub fn fallback_category_id(categories: &[Category]) -> i64 {
    categories
        .first()
        .map(|category| category.id)
        .filter(|id| *id != 0)
        .unwrap_or(FALLBACK_CATEGORY_ID)
}

fn category_id(values: &WizardValues, categories: &[Category]) -> i64 {
    values
        .get("categoryId")
        .and_then(coerce_id)
        .unwrap_or_else(|| fallback_category_id(categories))
}

fn text_or(values: &WizardValues, key: &str, fallback: &str) -> String {
    values
        .get(key)
        .filter(|value| is_truthy(value))
        .and_then(stringify)
        .unwrap_or_else(|| fallback.to_string())
}

fn list(values: &WizardValues, key: &str) -> Vec<String> {
    values.get(key).map(value_as_array).unwrap_or_default()
}

fn cover_image(value: Option<&Value>) -> Option<String> {
    let url = match value? {
        Value::Array(items) => items.first().and_then(stringify).unwrap_or_default(),
        other if is_truthy(other) => stringify(other).unwrap_or_default(),
        _ => String::new(),
    };
    if url.is_empty() { None } else { Some(url) }
}
