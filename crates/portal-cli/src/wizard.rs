use clap::ValueEnum;
use serde_json::Value;

use portal_spec::{
    Category, EditorEvent, FieldSpec, FieldType, UploadFile, Wizard, build_render_payload,
    render_json_ui, render_text, value_as_array,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RenderMode {
    Text,
    Json,
}

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Rendered step only.
    Clean,
    /// Also dumps the raw values after every change.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// One line typed at the wizard prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardInput {
    Next,
    Back,
    /// Zero-based step index; the review step is `steps.len()`.
    Jump(usize),
    Submit,
    Cancel,
    Help,
    Field { key: String, op: FieldOp },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    /// `key=value`
    Set(String),
    /// `key+=item`
    Add(String),
    /// `key-=item`
    Remove(String),
    /// `key!=row`
    Done(String),
}

pub const HELP: &str = "\
Commands:
  <enter> or :next     validate this step and continue
  :back                previous step
  :jump N              go to step N (the review step is the last one)
  :submit              save from the review step
  :cancel              leave without saving
  key=value            set a field (checkbox: yes/no)
  key+=item            add an option, checklist row, link or upload (file path)
  key-=item            remove an option, upload URL, or row number
  key!=N               mark checklist row N as done";

pub fn parse_input(line: &str) -> Result<WizardInput, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(WizardInput::Next);
    }
    if let Some(command) = line.strip_prefix(':') {
        let mut parts = command.split_whitespace();
        return match (parts.next(), parts.next()) {
            (Some("next"), None) => Ok(WizardInput::Next),
            (Some("back"), None) => Ok(WizardInput::Back),
            (Some("submit"), None) => Ok(WizardInput::Submit),
            (Some("cancel"), None) => Ok(WizardInput::Cancel),
            (Some("help"), None) => Ok(WizardInput::Help),
            (Some("jump"), Some(step)) => parse_row(step).map(WizardInput::Jump),
            _ => Err(format!("unknown command ':{}' (try :help)", command)),
        };
    }

    let (lhs, value) = line
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", line))?;
    let value = value.trim().to_string();
    let (key, op) = if let Some(key) = lhs.strip_suffix('+') {
        (key, FieldOp::Add(value))
    } else if let Some(key) = lhs.strip_suffix('-') {
        (key, FieldOp::Remove(value))
    } else if let Some(key) = lhs.strip_suffix('!') {
        (key, FieldOp::Done(value))
    } else {
        (lhs, FieldOp::Set(value))
    };
    let key = key.trim();
    if key.is_empty() {
        return Err("field key cannot be empty".into());
    }
    Ok(WizardInput::Field {
        key: key.to_string(),
        op,
    })
}

/// Parses a 1-based number typed by the user into a zero-based index.
fn parse_row(text: &str) -> Result<usize, String> {
    match text.trim().parse::<usize>() {
        Ok(number) if number > 0 => Ok(number - 1),
        _ => Err(format!("'{}' is not a positive number", text.trim())),
    }
}

fn parse_flag(text: &str) -> Result<bool, String> {
    match text.to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "on" => Ok(true),
        "" | "n" | "no" | "false" | "0" | "off" => Ok(false),
        other => Err(format!("'{}' is not yes or no", other)),
    }
}

/// What a field input line turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAction {
    Event(EditorEvent),
    Replace(Value),
    Upload(Vec<UploadFile>),
}

pub fn field_action(field: &FieldSpec, op: FieldOp) -> Result<FieldAction, String> {
    let refuse = |verb: &str| -> Result<FieldAction, String> {
        Err(format!(
            "field '{}' ({}) does not support {}",
            field.key,
            field.kind.as_str(),
            verb
        ))
    };
    let single = |event: EditorEvent| -> Result<FieldAction, String> {
        Ok(FieldAction::Event(event))
    };

    match (field.kind, op) {
        (FieldType::Checkbox, FieldOp::Set(text)) => {
            single(EditorEvent::Toggle(parse_flag(&text)?))
        }
        (FieldType::Multiselect | FieldType::Links, FieldOp::Set(text)) => {
            let items = value_as_array(&Value::String(text));
            Ok(FieldAction::Replace(Value::Array(
                items.into_iter().map(Value::String).collect(),
            )))
        }
        (
            FieldType::Checklist | FieldType::ImageUpload | FieldType::FileUpload,
            FieldOp::Set(_),
        ) => refuse("'=', use '+=' and '-='"),
        (_, FieldOp::Set(text)) => single(EditorEvent::Input(text)),

        (FieldType::Multiselect, FieldOp::Add(value)) => single(EditorEvent::ToggleOption {
            value,
            checked: true,
        }),
        (FieldType::Multiselect, FieldOp::Remove(value)) => single(EditorEvent::ToggleOption {
            value,
            checked: false,
        }),
        (FieldType::Checklist | FieldType::Links, FieldOp::Add(text)) => {
            single(EditorEvent::AppendRow(text))
        }
        (FieldType::Checklist | FieldType::Links, FieldOp::Remove(row)) => {
            single(EditorEvent::RemoveRow(parse_row(&row)?))
        }
        (FieldType::Checklist, FieldOp::Done(row)) => single(EditorEvent::SetRowDone {
            index: parse_row(&row)?,
            done: true,
        }),
        (FieldType::ImageUpload | FieldType::FileUpload, FieldOp::Add(paths)) => {
            let files = value_as_array(&Value::String(paths))
                .into_iter()
                .map(UploadFile::from_path)
                .collect();
            Ok(FieldAction::Upload(files))
        }
        (FieldType::ImageUpload | FieldType::FileUpload, FieldOp::Remove(url)) => {
            single(EditorEvent::RemoveUrl(url))
        }
        (_, FieldOp::Add(_)) => refuse("'+='"),
        (_, FieldOp::Remove(_)) => refuse("'-='"),
        (_, FieldOp::Done(_)) => refuse("'!='"),
    }
}

/// Prints wizard state between inputs.
pub struct WizardPresenter {
    format: RenderMode,
    verbosity: Verbosity,
    submit_label: Option<String>,
}

impl WizardPresenter {
    pub fn new(format: RenderMode, verbosity: Verbosity, submit_label: Option<String>) -> Self {
        Self {
            format,
            verbosity,
            submit_label,
        }
    }

    pub fn show(&self, wizard: &Wizard, categories: &[Category]) -> Result<(), serde_json::Error> {
        let payload = build_render_payload(wizard, categories, self.submit_label.as_deref());
        match self.format {
            RenderMode::Text => println!("{}", render_text(&payload)),
            RenderMode::Json => {
                println!("{}", serde_json::to_string_pretty(&render_json_ui(&payload))?)
            }
        }
        if self.verbosity.is_verbose() {
            println!("Values: {}", serde_json::to_string(wizard.values())?);
        }
        Ok(())
    }

    pub fn show_help(&self) {
        println!("{}", HELP);
    }

    pub fn show_notice(&self, message: &str) {
        println!("{}", message);
    }

    pub fn show_problem(&self, message: &str) {
        eprintln!("{}", message);
    }

    pub fn show_completion(&self, payload: &Value) -> Result<(), serde_json::Error> {
        println!("Saved.");
        println!("{}", serde_json::to_string_pretty(payload)?);
        Ok(())
    }

    pub fn show_cancelled(&self) {
        println!("Wizard cancelled.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_spec::apply_event;
    use serde_json::json;

    fn field(input: &str) -> (String, FieldOp) {
        match parse_input(input).expect("parse") {
            WizardInput::Field { key, op } => (key, op),
            other => panic!("expected field input, got {:?}", other),
        }
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_input("  ").unwrap(), WizardInput::Next);
        assert_eq!(parse_input(":back").unwrap(), WizardInput::Back);
        assert_eq!(parse_input(":jump 3").unwrap(), WizardInput::Jump(2));
        assert_eq!(parse_input(":submit").unwrap(), WizardInput::Submit);
        assert!(parse_input(":jump 0").is_err());
        assert!(parse_input(":launch").is_err());
        assert!(parse_input("no operator").is_err());
    }

    #[test]
    fn field_operators_parse() {
        assert_eq!(
            field("title = Release notes"),
            ("title".into(), FieldOp::Set("Release notes".into()))
        );
        assert_eq!(
            field("tags+=ops"),
            ("tags".into(), FieldOp::Add("ops".into()))
        );
        assert_eq!(
            field("linkUrls-=2"),
            ("linkUrls".into(), FieldOp::Remove("2".into()))
        );
        assert_eq!(
            field("stepsChecklist!=1"),
            ("stepsChecklist".into(), FieldOp::Done("1".into()))
        );
        assert_eq!(
            field("url=https://a.dev/?q=1"),
            ("url".into(), FieldOp::Set("https://a.dev/?q=1".into()))
        );
    }

    fn apply_all(field: &FieldSpec, current: Value, op: FieldOp) -> Value {
        match field_action(field, op).unwrap() {
            FieldAction::Event(event) => apply_event(field, Some(&current), event).unwrap(),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn checklist_add_appends_one_row() {
        let checklist = FieldSpec::new("stepsChecklist", "Checklist", FieldType::Checklist);
        let value = apply_all(
            &checklist,
            json!([{ "text": "Tag build", "done": false }]),
            FieldOp::Add("Deploy".into()),
        );
        assert_eq!(
            value,
            json!([
                { "text": "Tag build", "done": false },
                { "text": "Deploy", "done": false }
            ])
        );
        assert!(field_action(&checklist, FieldOp::Set("x".into())).is_err());
    }

    #[test]
    fn link_add_keeps_comma_separated_links() {
        let links = FieldSpec::new("linkUrls", "Links", FieldType::Links);
        let value = apply_all(
            &links,
            json!("https://a.dev, https://b.dev"),
            FieldOp::Add("https://c.dev".into()),
        );
        assert_eq!(
            value,
            json!(["https://a.dev", "https://b.dev", "https://c.dev"])
        );
    }

    #[test]
    fn checkbox_and_uploads_map_to_their_events() {
        let checkbox = FieldSpec::new("urgent", "Urgent", FieldType::Checkbox);
        assert_eq!(
            field_action(&checkbox, FieldOp::Set("yes".into())).unwrap(),
            FieldAction::Event(EditorEvent::Toggle(true))
        );
        assert!(field_action(&checkbox, FieldOp::Set("maybe".into())).is_err());

        let images = FieldSpec::new("imageUrls", "Images", FieldType::ImageUpload);
        match field_action(&images, FieldOp::Add("a.png, b.png".into())).unwrap() {
            FieldAction::Upload(files) => {
                let names = files.iter().map(|file| file.name.as_str()).collect::<Vec<_>>();
                assert_eq!(names, vec!["a.png", "b.png"]);
            }
            other => panic!("unexpected action {:?}", other),
        }

        let text = FieldSpec::new("title", "Title", FieldType::Text);
        let err = field_action(&text, FieldOp::Add("x".into())).unwrap_err();
        assert_eq!(err, "field 'title' (text) does not support '+='");
    }
}
