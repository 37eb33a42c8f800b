use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::session::AccessError;

pub const UPLOAD_FAILED: &str = "Upload failed";

/// A file picked in an upload editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub path: PathBuf,
}

impl UploadFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type. Allowed: png, jpg, webp, pdf, zip.")]
    UnsupportedType { name: String },
    #[error("{name} exceeds the {limit} byte upload limit")]
    TooLarge { name: String, limit: u64 },
    #[error("No file uploaded.")]
    Empty,
    #[error("upload of {name} failed: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Forbidden(#[from] AccessError),
    #[error("{0}")]
    Rejected(String),
}

impl UploadError {
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UPLOAD_FAILED.to_string()
        } else {
            message
        }
    }
}

/// External collaborator storing one file and returning its public URL.
pub trait Uploader {
    fn upload(&mut self, file: &UploadFile) -> Result<String, UploadError>;
}

/// Uploads files one after another and appends their URLs to `existing`.
///
/// The first failure aborts the batch; URLs of files stored before it are not returned.
pub fn upload_batch<U: Uploader + ?Sized>(
    uploader: &mut U,
    existing: &[String],
    files: &[UploadFile],
) -> Result<Vec<String>, UploadError> {
    let mut uploaded = Vec::with_capacity(files.len());
    for file in files {
        uploaded.push(uploader.upload(file)?);
    }
    let mut urls = existing.to_vec();
    urls.extend(uploaded);
    Ok(urls)
}

/// Severity of a transient editor notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// State of one upload editor between batches.
#[derive(Debug, Clone, Default)]
pub struct UploadEditor {
    uploading: bool,
    notice: Option<Notice>,
}

impl UploadEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Runs one batch. Returns the new URL list on success, `None` when nothing changed.
    pub fn pick<U: Uploader + ?Sized>(
        &mut self,
        uploader: &mut U,
        urls: &[String],
        files: &[UploadFile],
    ) -> Option<Vec<String>> {
        if files.is_empty() || self.uploading {
            return None;
        }
        self.uploading = true;
        let result = upload_batch(uploader, urls, files);
        self.uploading = false;
        match result {
            Ok(next) => {
                let count = next.len() - urls.len();
                info!(count, "files uploaded");
                self.notice = Some(Notice {
                    level: NoticeLevel::Success,
                    message: format!("{} file(s) uploaded", count),
                });
                Some(next)
            }
            Err(err) => {
                warn!(%err, "upload batch aborted");
                self.notice = Some(Notice {
                    level: NoticeLevel::Error,
                    message: err.user_message(),
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        fail_on: Option<usize>,
        calls: usize,
    }

    impl Uploader for Scripted {
        fn upload(&mut self, file: &UploadFile) -> Result<String, UploadError> {
            let call = self.calls;
            self.calls += 1;
            if self.fail_on == Some(call) {
                return Err(UploadError::Rejected(format!("{} rejected", file.name)));
            }
            Ok(format!("/uploads/{}", file.name))
        }
    }

    fn files(names: &[&str]) -> Vec<UploadFile> {
        names.iter().map(|name| UploadFile::from_path(*name)).collect()
    }

    #[test]
    fn batch_appends_in_order() {
        let mut uploader = Scripted {
            fail_on: None,
            calls: 0,
        };
        let urls = upload_batch(
            &mut uploader,
            &["/uploads/old.png".to_string()],
            &files(&["a.png", "b.png"]),
        )
        .expect("batch");
        assert_eq!(urls, vec!["/uploads/old.png", "/uploads/a.png", "/uploads/b.png"]);
    }

    #[test]
    fn failure_aborts_remaining_uploads() {
        let mut uploader = Scripted {
            fail_on: Some(1),
            calls: 0,
        };
        let mut editor = UploadEditor::new();
        let result = editor.pick(&mut uploader, &[], &files(&["a.png", "b.png", "c.png"]));
        assert!(result.is_none());
        assert_eq!(uploader.calls, 2);
        assert!(!editor.is_uploading());
        let notice = editor.notice().expect("notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "b.png rejected");
    }

    #[test]
    fn success_reports_count() {
        let mut uploader = Scripted {
            fail_on: None,
            calls: 0,
        };
        let mut editor = UploadEditor::new();
        let urls = editor
            .pick(&mut uploader, &[], &files(&["a.pdf"]))
            .expect("urls");
        assert_eq!(urls, vec!["/uploads/a.pdf"]);
        assert_eq!(editor.notice().expect("notice").message, "1 file(s) uploaded");
    }
}
