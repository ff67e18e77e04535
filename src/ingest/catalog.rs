//! Presentation directory scanning and the metadata catalog file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::extract::PresentationFormat;
use crate::error::Result;
use crate::setup::{ensure_dirs, DirCheck};

/// Catalog format version written to the metadata file.
pub const METADATA_VERSION: &str = "1.0";

/// Data directories the catalog expects under the project root.
pub const DATA_DIRS: &[&str] = &[
    "data/presentations",
    "data/metadata",
    "data/processed/chunks",
    "data/processed/embeddings",
];

/// Catalog entry for one presentation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationInfo {
    /// File stem.
    pub id: String,
    pub title: String,
    /// Path relative to the project root where possible.
    pub file_path: String,
    /// Lowercase extension without the dot.
    pub format: String,
    pub topic: String,
    #[serde(default)]
    pub key_concepts: Vec<String>,
    pub file_size: u64,
    /// Filled in by ingestion.
    #[serde(default)]
    pub slide_count: usize,
    #[serde(default)]
    pub processed: bool,
    pub created_at: String,
    pub modified_at: String,
}

impl PresentationInfo {
    /// File name component of `file_path`.
    pub fn file_name(&self) -> Option<String> {
        Path::new(&self.file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// Contents of `presentations_metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataFile {
    pub presentations: Vec<PresentationInfo>,
    pub total_count: usize,
    pub last_updated: String,
    pub version: String,
}

impl MetadataFile {
    /// Wrap `presentations`, stamping the current time.
    pub fn new(presentations: Vec<PresentationInfo>) -> Self {
        Self {
            total_count: presentations.len(),
            presentations,
            last_updated: Local::now().to_rfc3339(),
            version: METADATA_VERSION.to_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Record ingestion results for the entry whose file is named `file_name`
    /// (`deck.pptx`). Ids are file stems and may repeat across formats, so
    /// entries are matched by full file name. Returns `false` if not catalogued.
    pub fn mark_processed(&mut self, file_name: &str, slide_count: usize) -> bool {
        let entry = self
            .presentations
            .iter_mut()
            .find(|p| p.file_name().as_deref() == Some(file_name));
        match entry {
            Some(entry) => {
                entry.slide_count = slide_count;
                entry.processed = true;
                self.last_updated = Local::now().to_rfc3339();
                true
            }
            None => false,
        }
    }
}

/// List presentation files directly inside `dir` (non-recursive), sorted by id.
///
/// A missing directory is created and yields an empty list.
pub fn scan_presentations(dir: &Path, root: &Path) -> Result<Vec<PresentationInfo>> {
    if !dir.exists() {
        info!(dir = %dir.display(), "Presentations directory does not exist, creating it");
        std::fs::create_dir_all(dir)?;
        return Ok(Vec::new());
    }

    let mut presentations = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(dir = %dir.display(), "Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let Some(format) = PresentationFormat::from_path(&path) else {
            continue;
        };
        match describe(&path, format, root) {
            Ok(info) => presentations.push(info),
            Err(e) => warn!(path = %path.display(), "Skipping presentation: {}", e),
        }
    }
    presentations.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(presentations)
}

/// Scan `presentations_dir` and write the catalog to `output`.
pub fn generate_metadata(presentations_dir: &Path, output: &Path, root: &Path) -> Result<MetadataFile> {
    let metadata = MetadataFile::new(scan_presentations(presentations_dir, root)?);
    metadata.save(output)?;
    info!(
        count = metadata.total_count,
        path = %output.display(),
        "Generated presentation metadata"
    );
    Ok(metadata)
}

/// Ensure the data directory layout exists under `root`.
pub fn validate_data_structure(root: &Path) -> Result<Vec<DirCheck>> {
    ensure_dirs(root, DATA_DIRS)
}

/// `machine_learning_intro` → `Machine Learning Intro`.
pub fn title_from_stem(stem: &str) -> String {
    let mut title = String::with_capacity(stem.len());
    let mut prev_alpha = false;
    for ch in stem.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                title.extend(ch.to_lowercase());
            } else {
                title.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            title.push(ch);
            prev_alpha = false;
        }
    }
    title
}

fn describe(path: &Path, format: PresentationFormat, root: &Path) -> Result<PresentationInfo> {
    let meta = std::fs::metadata(path)?;
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let modified = meta.modified().ok();
    let created = meta.created().ok().or(modified);

    Ok(PresentationInfo {
        title: title_from_stem(&id),
        id,
        file_path: relative_display(path, root),
        format: format.as_str().to_string(),
        topic: "General".to_string(),
        key_concepts: Vec::new(),
        file_size: meta.len(),
        slide_count: 0,
        processed: false,
        created_at: iso_time(created),
        modified_at: iso_time(modified),
    })
}

fn relative_display(path: &Path, root: &Path) -> String {
    let rel: PathBuf = path
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf());
    rel.to_string_lossy().into_owned()
}

fn iso_time(time: Option<SystemTime>) -> String {
    time.map(|t| DateTime::<Local>::from(t).to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_title_from_stem() {
        assert_eq!(title_from_stem("machine_learning_intro"), "Machine Learning Intro");
        assert_eq!(title_from_stem("Q3_REVIEW"), "Q3 Review");
        assert_eq!(title_from_stem("ml-basics 2024"), "Ml-Basics 2024");
    }

    #[test]
    fn test_scan_missing_dir_creates_it() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data/presentations");
        let found = scan_presentations(&dir, tmp.path()).unwrap();
        assert!(found.is_empty());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_scan_filters_and_describes() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data/presentations");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("ml_intro_2024.pptx"), b"PK").unwrap();
        std::fs::write(dir.join("Budget.PDF"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.join("legacy.ppt"), b"\xd0\xcf").unwrap();
        std::fs::write(dir.join("notes.txt"), b"skip").unwrap();
        std::fs::write(dir.join("nested/inner.pdf"), b"skip").unwrap();

        let found = scan_presentations(&dir, tmp.path()).unwrap();
        let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["Budget", "legacy", "ml_intro_2024"]);

        let ml = &found[2];
        assert_eq!(ml.title, "Ml Intro 2024");
        assert_eq!(ml.format, "pptx");
        assert_eq!(ml.topic, "General");
        assert_eq!(ml.file_size, 2);
        assert_eq!(ml.file_path, "data/presentations/ml_intro_2024.pptx");
        assert!(!ml.processed);
        assert!(!ml.modified_at.is_empty());

        assert_eq!(found[0].format, "pdf", "extension is lowercased");
    }

    #[test]
    fn test_generate_metadata_writes_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data/presentations");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.pdf"), b"x").unwrap();
        let out = tmp.path().join("data/metadata/presentations_metadata.json");

        let meta = generate_metadata(&dir, &out, tmp.path()).unwrap();
        assert_eq!(meta.total_count, 1);
        assert_eq!(meta.version, METADATA_VERSION);

        let loaded = MetadataFile::load(&out).unwrap();
        assert_eq!(loaded, meta);
    }

    #[test]
    fn test_mark_processed() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("p");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("deck.pptx"), b"x").unwrap();
        let mut meta = MetadataFile::new(scan_presentations(&dir, tmp.path()).unwrap());

        assert!(meta.mark_processed("deck.pptx", 12));
        assert!(!meta.mark_processed("missing.pptx", 1));
        assert_eq!(meta.presentations[0].slide_count, 12);
        assert!(meta.presentations[0].processed);
    }

    #[test]
    fn test_mark_processed_same_stem_targets_one_entry() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("p");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("deck.pdf"), b"x").unwrap();
        std::fs::write(dir.join("deck.pptx"), b"x").unwrap();
        let mut meta = MetadataFile::new(scan_presentations(&dir, tmp.path()).unwrap());
        assert_eq!(meta.total_count, 2);

        assert!(meta.mark_processed("deck.pptx", 3));
        let pptx = meta.presentations.iter().find(|p| p.format == "pptx").unwrap();
        let pdf = meta.presentations.iter().find(|p| p.format == "pdf").unwrap();
        assert!(pptx.processed);
        assert_eq!(pptx.slide_count, 3);
        assert!(!pdf.processed);
    }

    #[test]
    fn test_validate_data_structure() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("data/metadata")).unwrap();
        let checks = validate_data_structure(tmp.path()).unwrap();
        assert_eq!(checks.len(), DATA_DIRS.len());
        assert_eq!(checks.iter().filter(|c| c.existed).count(), 1);
        for dir in DATA_DIRS {
            assert!(tmp.path().join(dir).is_dir());
        }
    }
}
