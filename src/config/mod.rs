//! Configuration for the narrator workspace.
//!
//! Loaded from `config.yaml` in the project root (or an explicit path), then
//! overlaid with `NARRATOR_*` environment variables. A missing file yields
//! defaults; a malformed one is an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NarratorError, Result};

/// Default config file name, resolved relative to the project root.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Example config shipped with a project, copied by `narrator setup`.
pub const CONFIG_EXAMPLE_FILE_NAME: &str = "config.yaml.example";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub cache: CacheConfig,
    pub chunking: ChunkingConfig,
    pub logging: LoggingConfig,
}

/// Workspace-relative data locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub presentations_dir: PathBuf,
    pub metadata_path: PathBuf,
    pub chunks_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            presentations_dir: PathBuf::from("data/presentations"),
            metadata_path: PathBuf::from("data/metadata/presentations_metadata.json"),
            chunks_dir: PathBuf::from("data/processed/chunks"),
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false, generation bypasses the cache entirely.
    pub enabled: bool,
    pub dir: PathBuf,
    /// Maximum age of a disk record in seconds. `None` keeps records forever.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("cache/responses"),
            ttl_secs: None,
        }
    }
}

/// Fixed-window chunking parameters (in characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Default config location for a project root.
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE_NAME)
    }

    /// Load `config.yaml` from `root`, falling back to defaults, then apply env overrides.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from_path(&Self::path_in(root))
    }

    /// Load from an explicit path. A missing file is not an error.
    ///
    /// Chunking is not validated here; commands that chunk call [`Config::validate`].
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(raw) => {
                debug!(path = %path.display(), "Loading configuration");
                Self::from_yaml(&raw)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse YAML text. Empty input is treated as an empty document.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overlay `NARRATOR_*` variables using `lookup` as the variable source.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("NARRATOR_CACHE_DIR") {
            self.cache.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("NARRATOR_CACHE_ENABLED") {
            self.cache.enabled = parse_bool("NARRATOR_CACHE_ENABLED", &v)?;
        }
        if let Some(v) = lookup("NARRATOR_CACHE_TTL_SECS") {
            let v = v.trim();
            self.cache.ttl_secs = if v.is_empty() {
                None
            } else {
                Some(parse_number("NARRATOR_CACHE_TTL_SECS", v)?)
            };
        }
        if let Some(v) = lookup("NARRATOR_CHUNK_SIZE") {
            self.chunking.chunk_size = parse_number("NARRATOR_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = lookup("NARRATOR_CHUNK_OVERLAP") {
            self.chunking.overlap = parse_number("NARRATOR_CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = lookup("NARRATOR_PRESENTATIONS_DIR") {
            self.paths.presentations_dir = PathBuf::from(v);
        }
        Ok(())
    }

    /// Reject settings that would break ingestion before any work starts.
    pub fn validate(&self) -> Result<()> {
        let ChunkingConfig {
            chunk_size,
            overlap,
        } = self.chunking;
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(NarratorError::InvalidChunking {
                chunk_size,
                overlap,
            });
        }
        Ok(())
    }

    /// Resolve a configured path against the project root (absolute paths pass through).
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(NarratorError::Config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| NarratorError::Config(format!("{key} must be a number, got '{value}'")))
}
