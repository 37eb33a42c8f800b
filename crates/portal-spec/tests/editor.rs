use serde_json::{Value, json};

use portal_spec::editor::{ChoiceState, FILE_ACCEPT, IMAGE_ACCEPT};
use portal_spec::{
    Category, EditorError, EditorEvent, EditorView, FieldOption, FieldSpec, FieldType,
    apply_event, default_value, editor_for, field_options,
};

#[test]
fn category_select_uses_categories_over_static_options() {
    let field = FieldSpec::new("categoryId", "Category", FieldType::Select)
        .required()
        .with_options(["1:Static"]);
    let categories = vec![Category::new(7, "Ops")];
    let view = editor_for(&field, Some(&json!("")), &categories);
    match view {
        EditorView::Select { options, .. } => {
            assert_eq!(
                options,
                vec![FieldOption {
                    value: "7".into(),
                    label: "Ops".into()
                }]
            );
        }
        other => panic!("unexpected editor {:?}", other),
    }

    let fallback = field_options(&field, &[]);
    assert_eq!(fallback[0].value, "1");
    assert_eq!(fallback[0].label, "Static");
}

#[test]
fn other_selects_keep_their_options() {
    let field = FieldSpec::new("status", "Status", FieldType::Select)
        .with_options(["DRAFT", "PUBLISHED"]);
    let options = field_options(&field, &[Category::new(7, "Ops")]);
    assert_eq!(options.len(), 2);
    assert_eq!(options[1].label, "PUBLISHED");
}

#[test]
fn every_type_renders_from_its_default() {
    for kind in FieldType::ALL {
        let field = FieldSpec::new("f", "F", kind);
        let value = default_value(&field);
        let view = editor_for(&field, Some(&value), &[]);
        let expected = match kind {
            FieldType::Text => EditorView::TextInput { value: "".into() },
            FieldType::Textarea => EditorView::TextArea {
                value: "".into(),
                rows: 4,
            },
            FieldType::Richtext => EditorView::TextArea {
                value: "".into(),
                rows: 8,
            },
            FieldType::Select => EditorView::Select {
                placeholder: "Select...",
                options: vec![],
                selected: "".into(),
            },
            FieldType::Multiselect => EditorView::CheckboxGroup { options: vec![] },
            FieldType::Tags => EditorView::TagInput {
                placeholder: "tag1, tag2, tag3",
                text: "".into(),
            },
            FieldType::Date => EditorView::DateInput { value: "".into() },
            FieldType::Number => EditorView::NumberInput { value: "".into() },
            FieldType::Checkbox => EditorView::Checkbox {
                caption: "Enabled",
                checked: false,
            },
            FieldType::Checklist => EditorView::Checklist { items: vec![] },
            FieldType::Links => EditorView::LinkList { links: vec![] },
            FieldType::ImageUpload => EditorView::Upload {
                label: "Images",
                accept: IMAGE_ACCEPT,
                urls: vec![],
            },
            FieldType::FileUpload => EditorView::Upload {
                label: "Files",
                accept: FILE_ACCEPT,
                urls: vec![],
            },
        };
        assert_eq!(view, expected, "{}", kind.as_str());
    }
}

#[test]
fn multiselect_toggles_membership() {
    let field = FieldSpec::new("tags", "Tags", FieldType::Multiselect)
        .with_options(["backend", "ops:Operations"]);
    let value = apply_event(
        &field,
        Some(&json!(["backend"])),
        EditorEvent::ToggleOption {
            value: "ops".into(),
            checked: true,
        },
    )
    .expect("toggle on");
    assert_eq!(value, json!(["backend", "ops"]));

    let view = editor_for(&field, Some(&value), &[]);
    assert_eq!(
        view,
        EditorView::CheckboxGroup {
            options: vec![
                ChoiceState {
                    value: "backend".into(),
                    label: "backend".into(),
                    checked: true
                },
                ChoiceState {
                    value: "ops".into(),
                    label: "Operations".into(),
                    checked: true
                },
            ]
        }
    );

    let value = apply_event(
        &field,
        Some(&value),
        EditorEvent::ToggleOption {
            value: "backend".into(),
            checked: false,
        },
    )
    .expect("toggle off");
    assert_eq!(value, json!(["ops"]));
}

#[test]
fn tags_round_trip_through_comma_text() {
    let field = FieldSpec::new("tags", "Tags", FieldType::Tags);
    let value = apply_event(&field, None, EditorEvent::Input("a, b, ,c".into())).expect("tags");
    assert_eq!(value, json!(["a", "b", "c"]));
    assert_eq!(
        editor_for(&field, Some(&value), &[]),
        EditorView::TagInput {
            placeholder: "tag1, tag2, tag3",
            text: "a, b, c".into()
        }
    );
}

#[test]
fn number_and_date_inputs() {
    let number = FieldSpec::new("n", "N", FieldType::Number);
    assert_eq!(
        apply_event(&number, None, EditorEvent::Input("42".into())).expect("number"),
        json!(42)
    );
    assert_eq!(
        apply_event(&number, None, EditorEvent::Input("x".into())).expect("number"),
        Value::Null
    );

    let date = FieldSpec::new("dueDate", "Due", FieldType::Date);
    assert_eq!(
        editor_for(&date, Some(&json!("2024-05-01T00:00:00.000Z")), &[]),
        EditorView::DateInput {
            value: "2024-05-01".into()
        }
    );
}

#[test]
fn checklist_rows_edit_independently() {
    let field = FieldSpec::new("stepsChecklist", "Checklist", FieldType::Checklist);
    let mut value = json!([]);
    value = apply_event(&field, Some(&value), EditorEvent::AddRow).expect("add");
    value = apply_event(&field, Some(&value), EditorEvent::AddRow).expect("add");
    value = apply_event(
        &field,
        Some(&value),
        EditorEvent::EditRow {
            index: 1,
            text: "Smoke test".into(),
        },
    )
    .expect("edit");
    value = apply_event(
        &field,
        Some(&value),
        EditorEvent::SetRowDone {
            index: 0,
            done: true,
        },
    )
    .expect("done");
    assert_eq!(
        value,
        json!([{ "text": "", "done": true }, { "text": "Smoke test", "done": false }])
    );

    value = apply_event(&field, Some(&value), EditorEvent::RemoveRow(0)).expect("remove");
    assert_eq!(value, json!([{ "text": "Smoke test", "done": false }]));

    let err = apply_event(&field, Some(&value), EditorEvent::RemoveRow(5)).expect_err("range");
    assert_eq!(
        err,
        EditorError::RowOutOfRange {
            key: "stepsChecklist".into(),
            index: 5
        }
    );
}

#[test]
fn links_keep_blank_rows_while_editing() {
    let field = FieldSpec::new("linkUrls", "Links", FieldType::Links);
    let value = apply_event(&field, Some(&json!(["https://a.dev"])), EditorEvent::AddRow)
        .expect("add");
    assert_eq!(value, json!(["https://a.dev", ""]));
    assert_eq!(
        editor_for(&field, Some(&value), &[]),
        EditorView::LinkList {
            links: vec!["https://a.dev".into(), "".into()]
        }
    );
}

#[test]
fn uploads_append_and_remove_urls() {
    let field = FieldSpec::new("imageUrls", "Images", FieldType::ImageUpload);
    let value = apply_event(
        &field,
        Some(&json!(["/uploads/a.png"])),
        EditorEvent::AppendUrls(vec!["/uploads/b.png".into()]),
    )
    .expect("append");
    assert_eq!(value, json!(["/uploads/a.png", "/uploads/b.png"]));
    let value = apply_event(
        &field,
        Some(&value),
        EditorEvent::RemoveUrl("/uploads/a.png".into()),
    )
    .expect("remove");
    assert_eq!(value, json!(["/uploads/b.png"]));
}

#[test]
fn mismatched_events_are_rejected() {
    let field = FieldSpec::new("done", "Done", FieldType::Checkbox);
    let err = apply_event(&field, None, EditorEvent::Input("yes".into())).expect_err("input");
    assert_eq!(
        err.to_string(),
        "field 'done' (checkbox) does not accept input events"
    );
    assert_eq!(
        apply_event(&field, None, EditorEvent::Toggle(true)).expect("toggle"),
        json!(true)
    );
}

#[test]
fn append_row_extends_comma_separated_links() {
    let field = FieldSpec::new("linkUrls", "Links", FieldType::Links);
    let value = apply_event(
        &field,
        Some(&json!("https://a.dev, https://b.dev")),
        EditorEvent::AppendRow("https://c.dev".into()),
    )
    .expect("append");
    assert_eq!(
        value,
        json!(["https://a.dev", "https://b.dev", "https://c.dev"])
    );

    let checklist = FieldSpec::new("stepsChecklist", "Checklist", FieldType::Checklist);
    let value = apply_event(&checklist, None, EditorEvent::AppendRow("Deploy".into()))
        .expect("append");
    assert_eq!(value, json!([{ "text": "Deploy", "done": false }]));

    let tags = FieldSpec::new("tags", "Tags", FieldType::Tags);
    let err = apply_event(&tags, None, EditorEvent::AppendRow("x".into())).expect_err("tags");
    assert_eq!(
        err.to_string(),
        "field 'tags' (tags) does not accept append_row events"
    );
}
