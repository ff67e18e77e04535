//! Administration of the on-disk response cache: enumerate, stats, list, clear.
//!
//! Reads are tolerant: a record that cannot be parsed still counts toward
//! file totals but is skipped (or shown as an error row) wherever its
//! contents are needed. Deletion failures are logged per file and the batch
//! carries on.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::{debug, warn};

use super::response_cache::{now_secs, RECORD_EXTENSION, TEMP_FILE_PREFIX};

/// Query text shown in listings is cut to this many characters.
pub const LIST_QUERY_CHARS: usize = 50;

/// Error summaries shown in listings are cut to this many characters.
const LIST_ERROR_CHARS: usize = 30;

const SECS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// Lenient view of a record: only the fields administration needs.
#[derive(Debug, Deserialize)]
struct RecordSummary {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    timestamp: f64,
}

/// A parsed cache file with its stored timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    pub file: String,
    pub timestamp: f64,
    pub size: u64,
}

/// Aggregate statistics over the cache directory.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Every `*.json` file, readable or not.
    pub total_files: usize,
    /// Sum of file sizes in bytes.
    pub total_bytes: u64,
    /// Readable entries only.
    pub entries: Vec<EntryInfo>,
}

impl CacheStats {
    pub fn total_size_mb(&self) -> f64 {
        self.total_bytes as f64 / 1024.0 / 1024.0
    }

    /// Entry with the smallest stored timestamp.
    pub fn oldest(&self) -> Option<&EntryInfo> {
        self.entries
            .iter()
            .min_by(|a, b| a.timestamp.total_cmp(&b.timestamp))
    }

    /// Entry with the largest stored timestamp.
    pub fn newest(&self) -> Option<&EntryInfo> {
        self.entries
            .iter()
            .max_by(|a, b| a.timestamp.total_cmp(&b.timestamp))
    }
}

/// One row of `list` output.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedEntry {
    pub file: String,
    /// Truncated query, or `Error: ...` for an unreadable record.
    pub query: String,
    /// `None` when the record could not be read.
    pub timestamp: Option<f64>,
    pub size: u64,
}

/// Result of `list`: the shown rows plus the total file count.
#[derive(Debug, Clone, Default)]
pub struct CacheListing {
    pub entries: Vec<ListedEntry>,
    pub total: usize,
}

impl CacheListing {
    /// Number of files not shown because of the limit.
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.entries.len())
    }
}

/// Management surface over a cache directory.
pub struct CacheManager {
    dir: PathBuf,
}

impl CacheManager {
    /// Open the cache at `dir`, creating it if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), "Failed to create cache directory: {}", e);
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All record files in the cache directory, sorted by file name.
    ///
    /// A missing or unreadable directory yields an empty list.
    pub fn cache_files(&self) -> Vec<PathBuf> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) => {
                warn!(dir = %self.dir.display(), "Failed to read cache directory: {}", e);
                return Vec::new();
            }
        };
        let mut files: Vec<PathBuf> = read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
            })
            .collect();
        files.sort();
        files
    }

    /// Count, size, and per-entry timestamps for the whole cache.
    pub fn stats(&self) -> CacheStats {
        let files = self.cache_files();
        let mut stats = CacheStats {
            total_files: files.len(),
            ..CacheStats::default()
        };
        for path in &files {
            let size = file_size(path);
            stats.total_bytes += size;
            match read_summary(path) {
                Ok(summary) => stats.entries.push(EntryInfo {
                    file: file_name(path),
                    timestamp: summary.timestamp,
                    size,
                }),
                Err(e) => debug!(path = %path.display(), "Skipping unreadable cache record: {}", e),
            }
        }
        stats
    }

    /// Up to `limit` entries in file-name order.
    pub fn list(&self, limit: usize) -> CacheListing {
        let files = self.cache_files();
        let entries = files
            .iter()
            .take(limit)
            .map(|path| {
                let size = file_size(path);
                match read_summary(path) {
                    Ok(summary) => ListedEntry {
                        file: file_name(path),
                        query: truncate_chars(
                            summary.query.as_deref().unwrap_or("N/A"),
                            LIST_QUERY_CHARS,
                        ),
                        timestamp: Some(summary.timestamp),
                        size,
                    },
                    Err(e) => ListedEntry {
                        file: file_name(path),
                        query: format!("Error: {}", truncate_chars(&e, LIST_ERROR_CHARS)),
                        timestamp: None,
                        size,
                    },
                }
            })
            .collect();
        CacheListing {
            entries,
            total: files.len(),
        }
    }

    /// Delete cache records and return how many files were removed.
    ///
    /// With `older_than_days`, only records whose stored timestamp is strictly
    /// before `now - days` are removed. Records without a readable timestamp
    /// are removed in that mode as well. Without it, temp files left by an
    /// interrupted write are swept too.
    pub fn clear(&self, older_than_days: Option<u64>) -> usize {
        self.clear_at(older_than_days, now_secs())
    }

    fn clear_at(&self, older_than_days: Option<u64>, now: f64) -> usize {
        let cutoff = older_than_days.map(|days| now - days as f64 * SECS_PER_DAY);
        let mut cleared = 0;

        for path in self.cache_files() {
            if let Some(cutoff) = cutoff {
                if let Ok(summary) = read_summary(&path) {
                    if summary.timestamp >= cutoff {
                        continue;
                    }
                }
            }
            match std::fs::remove_file(&path) {
                Ok(()) => cleared += 1,
                Err(e) => warn!(path = %path.display(), "Error deleting cache file: {}", e),
            }
        }

        if cutoff.is_none() {
            cleared += self.sweep_temp_files();
        }

        debug!(cleared, dir = %self.dir.display(), "Cleared cache records");
        cleared
    }

    /// Orphaned temp files from writes that never reached the rename.
    fn temp_files(&self) -> Vec<PathBuf> {
        let Ok(read_dir) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && file_name(path).starts_with(TEMP_FILE_PREFIX))
            .collect()
    }

    fn sweep_temp_files(&self) -> usize {
        let mut removed = 0;
        for path in self.temp_files() {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), "Error deleting cache temp file: {}", e),
            }
        }
        removed
    }
}

/// Render a stored timestamp as local `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(timestamp: f64) -> String {
    let secs = timestamp.floor() as i64;
    let nanos = ((timestamp - timestamp.floor()) * 1e9) as u32;
    match DateTime::from_timestamp(secs, nanos) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "N/A".to_string(),
    }
}

fn read_summary(path: &Path) -> std::result::Result<RecordSummary, String> {
    let data = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&data).map_err(|e| e.to_string())
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
