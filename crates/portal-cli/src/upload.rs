use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, info};

use portal_spec::{Session, UploadError, UploadFile, Uploader};

/// Largest file accepted by the local uploader.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Public prefix of stored files.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("valid regex"));

/// Stores uploads in a local directory and hands out `/uploads/<name>` URLs.
pub struct DirectoryUploader {
    root: PathBuf,
    session: Session,
}

impl DirectoryUploader {
    pub fn new(root: impl Into<PathBuf>, session: Session) -> Self {
        Self {
            root: root.into(),
            session,
        }
    }
}

impl Uploader for DirectoryUploader {
    fn upload(&mut self, file: &UploadFile) -> Result<String, UploadError> {
        self.session.require(Session::UPLOADERS, "upload files")?;
        if file.name.trim().is_empty() {
            return Err(UploadError::Empty);
        }
        let mime = mime_for(&file.name).ok_or_else(|| UploadError::UnsupportedType {
            name: file.name.clone(),
        })?;
        let io_error = |source| UploadError::Io {
            name: file.name.clone(),
            source,
        };
        let size = fs::metadata(&file.path).map_err(io_error)?.len();
        if size > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge {
                name: file.name.clone(),
                limit: MAX_UPLOAD_BYTES,
            });
        }

        fs::create_dir_all(&self.root).map_err(io_error)?;
        let stored = stored_name(&file.name, Utc::now().timestamp_millis());
        fs::copy(&file.path, self.root.join(&stored)).map_err(io_error)?;
        debug!(name = %file.name, mime, size, "stored upload");
        info!(stored = %stored, "upload complete");
        Ok(format!("{}/{}", PUBLIC_PREFIX, stored))
    }
}

fn mime_for(name: &str) -> Option<&'static str> {
    let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// `<millis>-<sanitized name>`, with `.bin` appended when the name has no extension.
pub fn stored_name(original: &str, millis: i64) -> String {
    let dashed = WHITESPACE.replace_all(original, "-");
    let safe = UNSAFE_CHARS.replace_all(&dashed, "");
    let suffix = if Path::new(original).extension().is_some() {
        ""
    } else {
        ".bin"
    };
    format!("{}-{}{}", millis, safe, suffix)
}
