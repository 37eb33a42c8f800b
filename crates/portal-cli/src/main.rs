mod upload;
mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use component_portal::{
    describe, list_categories, list_templates, to_entry_payload, to_task_payload,
    validate_template,
};
use portal_spec::{
    Category, Role, Session, SubmitError, TemplateKind, TemplateSpec, TemplateValidation,
    UploadEditor, UploadFile, Wizard, WizardError, WizardHost, WizardValues, upload_batch,
    value_as_array, values_to_entry, values_to_task,
};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use upload::DirectoryUploader;
use wizard::{
    FieldAction, RenderMode, Verbosity, WizardInput, WizardPresenter, field_action, parse_input,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const CATALOG_ENV: &str = "PORTAL_CATALOG";
const ROLE_ENV: &str = "PORTAL_ROLE";
const UPLOAD_DIR_ENV: &str = "PORTAL_UPLOAD_DIR";
const DEFAULT_UPLOAD_DIR: &str = "uploads";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Template-driven entry and task wizard",
    long_about = "Lists templates, runs the step wizard in a text shell, and converts wizard values into entry or task payloads"
)]
struct Cli {
    /// Catalog JSON with templates and categories (defaults to PORTAL_CATALOG, then the built-in catalog).
    #[arg(long, value_name = "CATALOG", global = true)]
    catalog: Option<PathBuf>,
    /// Session role: Admin, Editor or Viewer (defaults to PORTAL_ROLE, then Viewer).
    #[arg(long, global = true)]
    role: Option<String>,
    /// Log debug output to stderr and dump raw values.
    #[arg(long, alias = "debug", global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KindArg {
    Entry,
    Task,
}

impl From<KindArg> for TemplateKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Entry => TemplateKind::Entry,
            KindArg::Task => TemplateKind::Task,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum EmitMode {
    Entry,
    Task,
    Values,
}

#[derive(Subcommand)]
enum Command {
    /// List templates in catalog order.
    Templates {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Print the raw template JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run the step wizard for one template in a text shell.
    Wizard {
        #[arg(long, value_name = "ID")]
        template: u64,
        /// Optional JSON file containing initial values.
        #[arg(long, value_name = "VALUES")]
        answers: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
        /// What to print on submit (defaults to the template's kind).
        #[arg(long, value_enum)]
        emit: Option<EmitMode>,
        /// Directory receiving uploaded files (defaults to PORTAL_UPLOAD_DIR, then ./uploads).
        #[arg(long, value_name = "DIR")]
        uploads: Option<PathBuf>,
    },
    /// Check a template definition for structural problems.
    Validate {
        #[arg(long, value_name = "TEMPLATE")]
        template_file: PathBuf,
    },
    /// Convert a values JSON file into an entry or task payload.
    Payload {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
    },
    /// Print the JSON Schema of a template definition.
    Schema,
    /// Store files in the upload directory and print their URLs.
    Upload {
        #[arg(long, value_name = "DIR")]
        uploads: Option<PathBuf>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Settings resolved from flags, then environment, then defaults.
struct Settings {
    catalog_json: Option<String>,
    role: Role,
    verbose: bool,
}

impl Settings {
    fn resolve(cli: &Cli) -> CliResult<Self> {
        let catalog_path = cli
            .catalog
            .clone()
            .or_else(|| env::var_os(CATALOG_ENV).map(PathBuf::from));
        let catalog_json = match catalog_path {
            Some(path) => Some(
                fs::read_to_string(&path)
                    .map_err(|err| format!("failed to read catalog {}: {}", path.display(), err))?,
            ),
            None => None,
        };
        let env_role = env::var(ROLE_ENV).ok();
        let label = cli.role.as_deref().or(env_role.as_deref());
        let role = Role::resolve(label);
        if let Some(label) = label
            && Role::from_label(label).is_none()
        {
            warn!(label, "unknown role, falling back to {}", role);
        }
        Ok(Self {
            catalog_json,
            role,
            verbose: cli.verbose,
        })
    }

    fn session(&self) -> Session {
        Session::new(self.role)
    }

    fn component_config(&self) -> String {
        json!({ "catalog_json": self.catalog_json, "role": self.role.as_str() }).to_string()
    }
}

fn upload_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var_os(UPLOAD_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = Settings::resolve(&cli)?;
    match cli.command {
        Command::Templates { kind, json } => run_templates(&settings, kind, json),
        Command::Wizard {
            template,
            answers,
            format,
            emit,
            uploads,
        } => run_wizard(&settings, template, answers, format, emit, upload_dir(uploads)),
        Command::Validate { template_file } => run_validate(&template_file),
        Command::Payload { kind, values } => run_payload(&settings, kind, &values),
        Command::Schema => run_schema(),
        Command::Upload { uploads, files } => run_upload(&settings, upload_dir(uploads), files),
    }
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn read_values(path: &Path) -> CliResult<WizardValues> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    match serde_json::from_str::<Value>(&contents)? {
        Value::Object(values) => Ok(values),
        _ => Err(format!("{} must contain a JSON object", path.display()).into()),
    }
}

fn run_templates(settings: &Settings, kind: Option<KindArg>, as_json: bool) -> CliResult<()> {
    let label = kind.map(|kind| TemplateKind::from(kind).as_str()).unwrap_or("");
    let listed = parse_component_result(&list_templates(&settings.component_config(), label))?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }
    let templates: Vec<TemplateSpec> = serde_json::from_value(listed)?;
    if templates.is_empty() {
        println!("No templates.");
    }
    for template in templates {
        println!(
            "{:>4}  {:<5}  {} ({} steps, {} fields)",
            template.id,
            template.kind.as_str(),
            template.name,
            template.steps.len(),
            template.fields.len()
        );
    }
    Ok(())
}

fn run_validate(path: &Path) -> CliResult<()> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let report: TemplateValidation =
        serde_json::from_value(parse_component_result(&validate_template(&contents))?)?;
    for issue in report.errors() {
        eprintln!("error[{}] {}: {}", issue.code, issue.path, issue.message);
    }
    for issue in report.warnings() {
        eprintln!("warning[{}] {}: {}", issue.code, issue.path, issue.message);
    }
    if report.valid {
        println!("Template is valid.");
        Ok(())
    } else {
        Err(format!("template has {} error(s)", report.errors().count()).into())
    }
}

fn run_payload(settings: &Settings, kind: KindArg, values_path: &Path) -> CliResult<()> {
    let values = Value::Object(read_values(values_path)?).to_string();
    let config = settings.component_config();
    let response = match kind {
        KindArg::Entry => to_entry_payload(&config, &values),
        KindArg::Task => to_task_payload(&config, &values),
    };
    let payload = parse_component_result(&response)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(TemplateSpec);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_upload(settings: &Settings, dir: PathBuf, files: Vec<PathBuf>) -> CliResult<()> {
    let mut uploader = DirectoryUploader::new(dir, settings.session());
    let files = files.into_iter().map(UploadFile::from_path).collect::<Vec<_>>();
    let urls = upload_batch(&mut uploader, &[], &files).map_err(|err| err.user_message())?;
    println!("{}", serde_json::to_string_pretty(&urls)?);
    Ok(())
}

/// Receives the submitted values and builds the requested payload.
struct CliHost {
    emit: EmitMode,
    categories: Vec<Category>,
    session: Session,
    saved: Option<Value>,
}

impl WizardHost for CliHost {
    fn submit(&mut self, values: &WizardValues) -> Result<(), SubmitError> {
        let encoded = match self.emit {
            EmitMode::Values => Ok(Value::Object(values.clone())),
            EmitMode::Entry => {
                serde_json::to_value(values_to_entry(values, &self.categories, &self.session))
            }
            EmitMode::Task => {
                serde_json::to_value(values_to_task(values, &self.categories, &self.session))
            }
        };
        let payload = encoded.map_err(|err| SubmitError::Rejected(err.to_string()))?;
        self.saved = Some(payload);
        Ok(())
    }

    fn cancel(&mut self) {
        self.saved = None;
    }
}

fn run_wizard(
    settings: &Settings,
    template_id: u64,
    answers_path: Option<PathBuf>,
    format: RenderMode,
    emit: Option<EmitMode>,
    uploads: PathBuf,
) -> CliResult<()> {
    let config = settings.component_config();
    let template: TemplateSpec =
        serde_json::from_value(parse_component_result(&describe(&config, template_id))?)?;
    let categories: Vec<Category> =
        serde_json::from_value(parse_component_result(&list_categories(&config))?)?;
    let initial = answers_path.as_deref().map(read_values).transpose()?;

    let emit = emit.unwrap_or(match template.kind {
        TemplateKind::Entry => EmitMode::Entry,
        TemplateKind::Task => EmitMode::Task,
    });
    let mut host = CliHost {
        emit,
        categories: categories.clone(),
        session: settings.session(),
        saved: None,
    };
    let mut uploader = DirectoryUploader::new(uploads, settings.session());
    let mut upload_editor = UploadEditor::new();
    let presenter = WizardPresenter::new(format, Verbosity::from_verbose(settings.verbose), None);
    let mut wizard = Wizard::new(template, initial);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    presenter.show(&wizard, &categories)?;
    loop {
        if format == RenderMode::Text {
            print!("> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            debug!("input closed");
            wizard.cancel(&mut host);
            presenter.show_cancelled();
            return Ok(());
        };
        let input = match parse_input(&line?) {
            Ok(input) => input,
            Err(message) => {
                presenter.show_problem(&message);
                continue;
            }
        };

        match input {
            WizardInput::Next => {
                if let Err(err) = wizard.next()
                    && !matches!(err, WizardError::MissingRequired { .. })
                {
                    presenter.show_problem(&err.to_string());
                    continue;
                }
            }
            WizardInput::Back => {
                wizard.back();
            }
            WizardInput::Jump(index) => {
                if let Err(err) = wizard.jump_to(index) {
                    presenter.show_problem(&err.to_string());
                    continue;
                }
            }
            WizardInput::Submit => match wizard.submit(&mut host) {
                Ok(()) => {
                    let saved = host.saved.take().unwrap_or(Value::Null);
                    presenter.show_completion(&saved)?;
                    return Ok(());
                }
                Err(WizardError::SubmitRejected(_)) => {}
                Err(err) => {
                    presenter.show_problem(&err.to_string());
                    continue;
                }
            },
            WizardInput::Cancel => {
                wizard.cancel(&mut host);
                presenter.show_cancelled();
                return Ok(());
            }
            WizardInput::Help => {
                presenter.show_help();
                continue;
            }
            WizardInput::Field { key, op } => {
                let Some(field) = wizard.template().field(&key).cloned() else {
                    presenter.show_problem(&WizardError::UnknownField(key).to_string());
                    continue;
                };
                let applied = match field_action(&field, op) {
                    Err(message) => Err(message),
                    Ok(FieldAction::Replace(value)) => {
                        wizard.update_value(key, value);
                        Ok(())
                    }
                    Ok(FieldAction::Event(event)) => wizard
                        .apply_event(&key, event)
                        .map_err(|err| err.to_string()),
                    Ok(FieldAction::Upload(files)) => {
                        let urls = wizard.value(&key).map(value_as_array).unwrap_or_default();
                        let uploaded = upload_editor.pick(&mut uploader, &urls, &files);
                        if let Some(notice) = upload_editor.notice() {
                            presenter.show_notice(&notice.message);
                        }
                        match uploaded {
                            Some(next) => wizard.update_value(
                                key,
                                Value::Array(next.into_iter().map(Value::String).collect()),
                            ),
                            None => continue,
                        }
                        Ok(())
                    }
                };
                if let Err(message) = applied {
                    presenter.show_problem(&message);
                    continue;
                }
            }
        }
        presenter.show(&wizard, &categories)?;
    }
}
