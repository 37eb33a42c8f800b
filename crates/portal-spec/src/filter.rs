//! List filters over stored entries and tasks.
//!
//! Filters are built from loose query parameters; anything malformed is ignored rather than
//! rejected, so a bad parameter widens the result instead of failing the listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::payload::{EntryPayload, EntryStatus, TaskPayload, TaskPriority, TaskStatus};
use crate::values::{coerce_number, stringify, value_as_array};

/// A stored library entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub id: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: EntryPayload,
}

/// A stored task card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub task: TaskPayload,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryFilter {
    pub search: Option<String>,
    pub category_id: Option<f64>,
    pub status: Option<EntryStatus>,
    /// Lower-cased; every one must be present.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskFilter {
    pub search: Option<String>,
    pub category_id: Option<f64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub owner: Option<String>,
    pub tags: Vec<String>,
}

impl EntryFilter {
    /// Reads `search`, `categoryId`, `status` and `tags` (or `tag`).
    pub fn from_query(query: &Map<String, Value>) -> Self {
        Self {
            search: query_text(query, "search"),
            category_id: query_category(query),
            status: query_text(query, "status")
                .as_deref()
                .and_then(EntryStatus::from_label),
            tags: query_tags(query),
        }
    }

    pub fn matches(&self, record: &EntryRecord) -> bool {
        let entry = &record.entry;
        if let Some(needle) = &self.search {
            let haystacks = [
                entry.title.as_str(),
                entry.short_description.as_str(),
                entry.full_description.as_str(),
            ];
            if !haystacks.iter().any(|text| text.contains(needle.as_str())) {
                return false;
            }
        }
        if let Some(id) = self.category_id
            && entry.category_id as f64 != id
        {
            return false;
        }
        if let Some(status) = self.status
            && entry.status != status
        {
            return false;
        }
        has_all_tags(&entry.tags, &self.tags)
    }

    /// Matching records, most recently updated first.
    pub fn apply(&self, records: &[EntryRecord]) -> Vec<EntryRecord> {
        let mut matched = records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect::<Vec<_>>();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matched
    }
}

impl TaskFilter {
    /// Reads `search`, `categoryId`, `status`, `priority`, `owner` and `tags` (or `tag`).
    pub fn from_query(query: &Map<String, Value>) -> Self {
        Self {
            search: query_text(query, "search"),
            category_id: query_category(query),
            status: query_text(query, "status")
                .as_deref()
                .and_then(TaskStatus::from_label),
            priority: query_text(query, "priority")
                .as_deref()
                .and_then(TaskPriority::from_label),
            owner: query_text(query, "owner"),
            tags: query_tags(query),
        }
    }

    pub fn matches(&self, record: &TaskRecord) -> bool {
        let task = &record.task;
        if let Some(needle) = &self.search {
            let haystacks = [
                task.title.as_str(),
                task.objective.as_str(),
                task.owner.as_str(),
                task.notes.as_deref().unwrap_or(""),
            ];
            if !haystacks.iter().any(|text| text.contains(needle.as_str())) {
                return false;
            }
        }
        if let Some(id) = self.category_id
            && task.category_id as f64 != id
        {
            return false;
        }
        if let Some(status) = self.status
            && task.status != status
        {
            return false;
        }
        if let Some(priority) = self.priority
            && task.priority != priority
        {
            return false;
        }
        if let Some(owner) = &self.owner
            && !task.owner.contains(owner.as_str())
        {
            return false;
        }
        has_all_tags(&task.tags, &self.tags)
    }

    /// Matching records, most recently updated first.
    pub fn apply(&self, records: &[TaskRecord]) -> Vec<TaskRecord> {
        let mut matched = records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect::<Vec<_>>();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matched
    }
}

/// Non-empty text parameter.
fn query_text(query: &Map<String, Value>, key: &str) -> Option<String> {
    query
        .get(key)
        .and_then(stringify)
        .filter(|text| !text.is_empty())
}

fn query_category(query: &Map<String, Value>) -> Option<f64> {
    query.get("categoryId").and_then(coerce_number)
}

fn query_tags(query: &Map<String, Value>) -> Vec<String> {
    let raw = match query.get("tags") {
        Some(Value::Null) | None => query.get("tag"),
        present => present,
    };
    raw.map(value_as_array)
        .unwrap_or_default()
        .into_iter()
        .map(|tag| tag.to_lowercase())
        .collect()
}

fn has_all_tags(tags: &[String], wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return true;
    }
    let lowered = tags.iter().map(|tag| tag.to_lowercase()).collect::<Vec<_>>();
    wanted.iter().all(|tag| lowered.contains(tag))
}
