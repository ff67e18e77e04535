//! Project layout bootstrap: directories, initial metadata, config file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{CONFIG_EXAMPLE_FILE_NAME, CONFIG_FILE_NAME};
use crate::error::Result;
use crate::ingest::catalog::MetadataFile;

/// Directories created by `narrator setup`.
pub const PROJECT_DIRS: &[&str] = &[
    "data/presentations",
    "data/processed/chunks",
    "data/processed/embeddings",
    "data/metadata",
    "models",
    "cache/responses",
    "docs",
    "scripts",
];

/// Directories `verify_structure` expects to find.
pub const REQUIRED_DIRS: &[&str] = &[
    "data/presentations",
    "data/metadata",
    "models",
    "cache/responses",
];

/// Default metadata location relative to the project root.
pub const METADATA_PATH: &str = "data/metadata/presentations_metadata.json";

/// Outcome of checking (and possibly creating) one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirCheck {
    pub path: PathBuf,
    /// Whether the directory was already present before the check.
    pub existed: bool,
}

/// What `create_initial_metadata` / `create_config_from_example` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Created,
    AlreadyExists,
    /// The source to copy from is missing.
    SourceMissing,
}

/// Ensure each of `dirs` exists under `root`, creating missing ones.
pub fn ensure_dirs(root: &Path, dirs: &[&str]) -> Result<Vec<DirCheck>> {
    dirs.iter()
        .map(|dir| -> Result<DirCheck> {
            let path = root.join(dir);
            let existed = path.is_dir();
            if !existed {
                std::fs::create_dir_all(&path)?;
                debug!(path = %path.display(), "Created directory");
            }
            Ok(DirCheck { path, existed })
        })
        .collect()
}

/// Create the full project directory layout under `root`.
pub fn create_directory_structure(root: &Path) -> Result<Vec<DirCheck>> {
    ensure_dirs(root, PROJECT_DIRS)
}

/// Write an empty metadata file unless one already exists.
pub fn create_initial_metadata(root: &Path) -> Result<FileOutcome> {
    let path = root.join(METADATA_PATH);
    if path.exists() {
        return Ok(FileOutcome::AlreadyExists);
    }
    MetadataFile::new(Vec::new()).save(&path)?;
    info!(path = %path.display(), "Created initial metadata file");
    Ok(FileOutcome::Created)
}

/// Copy `config.yaml.example` to `config.yaml` when the latter is absent.
pub fn create_config_from_example(root: &Path) -> Result<FileOutcome> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        return Ok(FileOutcome::AlreadyExists);
    }
    let example_path = root.join(CONFIG_EXAMPLE_FILE_NAME);
    if !example_path.exists() {
        return Ok(FileOutcome::SourceMissing);
    }
    std::fs::copy(&example_path, &config_path)?;
    info!(path = %config_path.display(), "Created config from example");
    Ok(FileOutcome::Created)
}

/// Report which required directories exist. Nothing is created.
pub fn verify_structure(root: &Path) -> Vec<DirCheck> {
    REQUIRED_DIRS
        .iter()
        .map(|dir| {
            let path = root.join(dir);
            DirCheck {
                existed: path.is_dir(),
                path,
            }
        })
        .collect()
}
