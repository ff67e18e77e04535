//! Presentation validation: is the file there, supported, and readable?

use std::path::{Path, PathBuf};

use tracing::debug;

use super::extract::{extract_text, PresentationFormat};

/// Fewer trimmed characters than this means the file is treated as empty.
pub const MIN_TEXT_CHARS: usize = 10;

/// Verdict for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub message: String,
}

impl Validation {
    fn ok(message: String) -> Self {
        Self {
            valid: true,
            message,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Per-file results for a directory.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub results: Vec<(PathBuf, Validation)>,
}

impl ValidationReport {
    pub fn valid_count(&self) -> usize {
        self.results.iter().filter(|(_, v)| v.valid).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.results.len() - self.valid_count()
    }
}

/// Check that `path` is an existing presentation with extractable text.
pub fn validate_presentation_file(path: &Path) -> Validation {
    if !path.exists() {
        return Validation::invalid("File does not exist");
    }
    if !path.is_file() {
        return Validation::invalid("Path is not a file");
    }
    if PresentationFormat::from_path(path).is_none() {
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        return Validation::invalid(format!("Unsupported file type: {ext}"));
    }

    match extract_text(path) {
        Ok(extracted) => {
            if extracted.text.trim().chars().count() < MIN_TEXT_CHARS {
                Validation::invalid("File appears to be empty or unreadable")
            } else {
                Validation::ok(format!(
                    "Valid ({} characters extracted)",
                    extracted.text.chars().count()
                ))
            }
        }
        Err(e) => {
            debug!(path = %path.display(), "Validation extraction failed: {}", e);
            Validation::invalid(format!("Error processing file: {e}"))
        }
    }
}

/// Validate every presentation file directly inside `dir`, sorted by name.
///
/// Returns `None` when `dir` does not exist.
pub fn validate_all(dir: &Path) -> Option<ValidationReport> {
    let read_dir = std::fs::read_dir(dir).ok()?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && PresentationFormat::from_path(path).is_some())
        .collect();
    files.sort();

    let results = files
        .into_iter()
        .map(|path| {
            let verdict = validate_presentation_file(&path);
            (path, verdict)
        })
        .collect();
    Some(ValidationReport { results })
}
