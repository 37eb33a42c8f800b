use serde_json::{Value, json};

use portal_spec::payload::{EntryStatus, TaskPriority, TaskStatus, parse_due_date};
use portal_spec::{Category, Role, Session, WizardValues, values_to_entry, values_to_task};

fn values(value: Value) -> WizardValues {
    value.as_object().cloned().expect("object")
}

fn categories() -> Vec<Category> {
    vec![Category::new(7, "Ops"), Category::new(9, "Docs")]
}

#[test]
fn blank_entry_gets_placeholders() {
    let session = Session::new(Role::Editor);
    let entry = values_to_entry(&values(json!({ "title": "  " })), &[], &session);
    assert_eq!(entry.title, "  ");

    let entry = values_to_entry(&WizardValues::new(), &[], &session);
    assert_eq!(entry.title, "Untitled Entry");
    assert_eq!(entry.short_description, "");
    assert_eq!(entry.category_id, 1);
    assert_eq!(entry.status, EntryStatus::Draft);
    assert_eq!(entry.cover_image_url, None);
    assert_eq!(entry.created_by, "Editor");
    assert_eq!(entry.updated_by, "Editor");
}

#[test]
fn entry_fields_are_normalized() {
    let session = Session::new(Role::Admin);
    let entry = values_to_entry(
        &values(json!({
            "title": "Runbook",
            "categoryId": "9",
            "tags": "ops, oncall ,",
            "status": "PUBLISHED",
            "coverImageUrl": ["/uploads/cover.png", "/uploads/other.png"],
            "galleryImageUrls": ["/uploads/a.png", ""],
            "linkUrls": ["https://example.com", " "]
        })),
        &categories(),
        &session,
    );
    assert_eq!(entry.category_id, 9);
    assert_eq!(entry.tags, vec!["ops", "oncall"]);
    assert_eq!(entry.status, EntryStatus::Published);
    assert_eq!(entry.cover_image_url.as_deref(), Some("/uploads/cover.png"));
    assert_eq!(entry.gallery_image_urls, vec!["/uploads/a.png"]);
    assert_eq!(entry.link_urls, vec!["https://example.com"]);
}

#[test]
fn category_falls_back_to_first_category() {
    let session = Session::default();
    let entry = values_to_entry(
        &values(json!({ "categoryId": "not a number" })),
        &categories(),
        &session,
    );
    assert_eq!(entry.category_id, 7);
    let entry = values_to_entry(&values(json!({ "categoryId": "" })), &categories(), &session);
    assert_eq!(entry.category_id, 7);
}

#[test]
fn unknown_status_labels_use_defaults() {
    let session = Session::default();
    let entry = values_to_entry(&values(json!({ "status": "LIVE" })), &[], &session);
    assert_eq!(entry.status, EntryStatus::Draft);
    let task = values_to_task(
        &values(json!({ "status": "SOMEDAY", "priority": "URGENT" })),
        &[],
        &session,
    );
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.priority, TaskPriority::Medium);
}

#[test]
fn task_checklist_ids_and_dates() {
    let session = Session::new(Role::Editor);
    let task = values_to_task(
        &values(json!({
            "title": "Release 1.2",
            "stepsChecklist": [
                { "text": "Tag build", "done": true },
                { "text": "" },
                42
            ],
            "relatedEntryIds": ["3", 5, "x", null],
            "dueDate": "2024-05-01",
            "priority": "HIGH",
            "status": "IN_PROGRESS",
            "notes": ""
        })),
        &categories(),
        &session,
    );
    assert_eq!(task.steps_checklist.len(), 2);
    assert_eq!(task.steps_checklist[0].text, "Tag build");
    assert!(task.steps_checklist[0].done);
    assert!(!task.steps_checklist[1].done);
    assert_eq!(task.related_entry_ids, vec![3, 5]);
    assert_eq!(task.priority, TaskPriority::High);
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.owner, "Editor");
    assert_eq!(task.notes, None);
    assert_eq!(task.category_id, 7);

    let encoded = serde_json::to_value(&task).expect("encode");
    assert_eq!(encoded["dueDate"], "2024-05-01T00:00:00Z");
    assert_eq!(encoded["status"], "IN_PROGRESS");
    assert_eq!(encoded["stepsChecklist"][0], json!({ "text": "Tag build", "done": true }));
}

#[test]
fn due_date_parsing_is_total() {
    assert!(parse_due_date(&json!("")).is_none());
    assert!(parse_due_date(&Value::Null).is_none());
    assert!(parse_due_date(&json!("next tuesday")).is_none());
    let stamp = parse_due_date(&json!("2024-05-01T10:30:00+02:00")).expect("rfc3339");
    assert_eq!(stamp.to_rfc3339(), "2024-05-01T08:30:00+00:00");
}

#[test]
fn related_ids_require_a_sequence() {
    let task = values_to_task(
        &values(json!({ "relatedEntryIds": "1,2" })),
        &[],
        &Session::default(),
    );
    assert!(task.related_entry_ids.is_empty());
    assert_eq!(task.title, "Untitled Task");
    assert_eq!(task.owner, "Viewer");
}
