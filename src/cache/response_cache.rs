//! Response cache keyed by `(query, context)`.
//!
//! One JSON record per key under a cache directory (`<key>.json`), fronted by
//! an in-memory mirror for the lifetime of the process. The disk copy is the
//! source of truth across restarts; the mirror is only a shortcut.
//!
//! The cache is best-effort: unreadable records read as misses and failed
//! writes are logged, never returned to the caller.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::config::{CacheConfig, Config};
use crate::error::Result;

/// File extension of cache records.
pub const RECORD_EXTENSION: &str = "json";

/// Name prefix of in-flight temp files in the cache directory.
pub const TEMP_FILE_PREFIX: &str = ".narrator-";

/// On-disk cache record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// The query the response was produced for.
    pub query: String,
    /// The cached response text.
    pub response: String,
    /// Seconds since the Unix epoch when the record was written.
    pub timestamp: f64,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    response: String,
    stored_at: f64,
}

/// Two-layer response cache: process-local map in front of one file per key.
///
/// Safe to share behind an `Arc`; the memory layer is mutex-guarded and disk
/// writes go through a temp file renamed over the target.
#[derive(Debug)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl_secs: Option<u64>,
    memory: Mutex<HashMap<String, MemoryEntry>>,
}

impl ResponseCache {
    /// Create a cache rooted at `dir`, creating the directory if needed.
    ///
    /// Failure to create the directory is logged; subsequent writes will
    /// fail (and be logged) the same way.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), "Failed to create response cache directory: {}", e);
        }
        Self {
            dir,
            ttl_secs: None,
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Build a cache from config, resolving the directory against `root`.
    pub fn from_config(root: &Path, config: &CacheConfig) -> Self {
        Self::new(Config::resolve(root, &config.dir)).with_ttl(config.ttl_secs)
    }

    /// Expire entries older than `ttl_secs`. `None` keeps entries forever.
    pub fn with_ttl(mut self, ttl_secs: Option<u64>) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Directory holding the cache records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build a deterministic cache key: SHA-256 of `(query, context)`.
    ///
    /// Fields are length-prefixed so a separator inside either string cannot
    /// make two different pairs hash the same input.
    pub fn cache_key(query: &str, context: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update((query.len() as u64).to_le_bytes());
        hasher.update(query.as_bytes());
        hasher.update((context.len() as u64).to_le_bytes());
        hasher.update(context.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Path of the record file for `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{RECORD_EXTENSION}"))
    }

    /// Look up a cached response.
    ///
    /// Checks memory first, then disk. A disk hit is promoted into memory so
    /// repeated lookups in the same process skip the file read. Missing,
    /// expired, and unreadable records all return `None`.
    pub fn get(&self, query: &str, context: &str) -> Option<String> {
        let key = Self::cache_key(query, context);
        let now = now_secs();

        {
            let mut memory = self.lock_memory();
            if let Some(entry) = memory.get(&key) {
                if !self.is_expired(entry.stored_at, now) {
                    return Some(entry.response.clone());
                }
                debug!(key = %short(&key), "Memory cache entry expired");
                memory.remove(&key);
            }
        }

        let record = read_record(&self.record_path(&key))?;
        if self.is_expired(record.timestamp, now) {
            debug!(key = %short(&key), "Disk cache entry expired");
            return None;
        }

        self.lock_memory().insert(
            key,
            MemoryEntry {
                response: record.response.clone(),
                stored_at: record.timestamp,
            },
        );
        Some(record.response)
    }

    /// Store a response, overwriting any previous entry for the same pair.
    pub fn set(&self, query: &str, context: &str, response: &str) {
        let key = Self::cache_key(query, context);
        let timestamp = now_secs();

        self.lock_memory().insert(
            key.clone(),
            MemoryEntry {
                response: response.to_string(),
                stored_at: timestamp,
            },
        );

        let record = CacheRecord {
            query: query.to_string(),
            response: response.to_string(),
            timestamp,
        };
        let path = self.record_path(&key);
        if let Err(e) = self.write_record(&path, &record) {
            warn!(path = %path.display(), "Failed to write response cache record: {}", e);
        }
    }

    /// Return `true` if `get` would produce a value for this pair.
    pub fn contains(&self, query: &str, context: &str) -> bool {
        self.get(query, context).is_some()
    }

    /// Number of entries in the in-memory layer.
    pub fn len(&self) -> usize {
        self.lock_memory().len()
    }

    /// Return `true` if the in-memory layer is empty.
    pub fn is_empty(&self) -> bool {
        self.lock_memory().is_empty()
    }

    /// Drop the in-memory layer. Disk records are untouched.
    pub fn clear_memory(&self) {
        self.lock_memory().clear();
    }

    // -- private helpers ---------------------------------------------------

    fn lock_memory(&self) -> std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, stored_at: f64, now: f64) -> bool {
        match self.ttl_secs {
            Some(ttl) => now - stored_at > ttl as f64,
            None => false,
        }
    }

    /// Write `record` to a temp file in the cache dir, then rename it over `path`.
    fn write_record(&self, path: &Path, record: &CacheRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_vec(record)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(&self.dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Read and parse a record; any failure is logged and reported as `None`.
pub(crate) fn read_record(path: &Path) -> Option<CacheRecord> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), "Failed to read response cache record: {}", e);
            return None;
        }
    };
    match serde_json::from_str(&data) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = %path.display(), "Response cache record is corrupt, ignoring: {}", e);
            None
        }
    }
}

pub(crate) fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

fn short(key: &str) -> &str {
    &key[..8.min(key.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cache(tmp: &TempDir) -> ResponseCache {
        ResponseCache::new(tmp.path().join("responses"))
    }

    #[test]
    fn test_cache_key_deterministic() {
        let k1 = ResponseCache::cache_key("what is RAG?", "slides 1-3");
        let k2 = ResponseCache::cache_key("what is RAG?", "slides 1-3");
        assert_eq!(k1, k2);
        assert_eq!(k1.len(), 64, "hex SHA-256 digest");
    }

    #[test]
    fn test_cache_key_query_aware() {
        let k1 = ResponseCache::cache_key("hello", "ctx");
        let k2 = ResponseCache::cache_key("goodbye", "ctx");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_cache_key_context_aware() {
        let k1 = ResponseCache::cache_key("hello", "context A");
        let k2 = ResponseCache::cache_key("hello", "context B");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_cache_key_no_separator_collision() {
        let k1 = ResponseCache::cache_key("a|||b", "c");
        let k2 = ResponseCache::cache_key("a", "b|||c");
        assert_ne!(
            k1, k2,
            "length-prefixed encoding must prevent separator collisions"
        );
    }

    #[test]
    fn test_new_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("responses");
        let cache = ResponseCache::new(&dir);
        assert!(dir.is_dir());
        assert_eq!(cache.dir(), dir.as_path());
    }

    #[test]
    fn test_cache_hit_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = test_cache(&tmp);
        assert!(cache.get("q", "c").is_none());
        cache.set("q", "c", "response");
        assert_eq!(cache.get("q", "c"), Some("response".into()));
        assert!(cache.contains("q", "c"));
        assert!(!cache.contains("q", "other"));
    }

    #[test]
    fn test_set_writes_record_file() {
        let tmp = TempDir::new().unwrap();
        let cache = test_cache(&tmp);
        cache.set("the query", "the context", "the response");

        let key = ResponseCache::cache_key("the query", "the context");
        let path = cache.record_path(&key);
        assert!(path.exists(), "record should be written at {:?}", path);

        let record: CacheRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(record.query, "the query");
        assert_eq!(record.response, "the response");
        assert!(record.timestamp > 0.0);
    }

    #[test]
    fn test_overwrite_last_writer_wins() {
        let tmp = TempDir::new().unwrap();
        let cache = test_cache(&tmp);
        cache.set("q", "c", "first");
        cache.set("q", "c", "second");
        assert_eq!(cache.get("q", "c"), Some("second".into()));

        // Disk copy is overwritten too.
        let fresh = test_cache(&tmp);
        assert_eq!(fresh.get("q", "c"), Some("second".into()));
    }

    #[test]
    fn test_persists_across_instances() {
        let tmp = TempDir::new().unwrap();
        test_cache(&tmp).set("q", "c", "from disk");

        let fresh = test_cache(&tmp);
        assert!(fresh.is_empty(), "memory layer starts empty");
        assert_eq!(fresh.get("q", "c"), Some("from disk".into()));
    }

    #[test]
    fn test_disk_hit_promoted_to_memory() {
        let tmp = TempDir::new().unwrap();
        test_cache(&tmp).set("q", "c", "value");

        let fresh = test_cache(&tmp);
        assert_eq!(fresh.len(), 0);
        let _ = fresh.get("q", "c");
        assert_eq!(fresh.len(), 1);

        // Served from memory once promoted, even if the file disappears.
        let key = ResponseCache::cache_key("q", "c");
        std::fs::remove_file(fresh.record_path(&key)).unwrap();
        assert_eq!(fresh.get("q", "c"), Some("value".into()));
    }

    #[test]
    fn test_corrupt_record_is_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = test_cache(&tmp);
        let key = ResponseCache::cache_key("q", "c");
        std::fs::write(cache.record_path(&key), "{not json").unwrap();
        assert!(cache.get("q", "c").is_none());
    }

    #[test]
    fn test_record_without_response_is_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = test_cache(&tmp);
        let key = ResponseCache::cache_key("q", "c");
        std::fs::write(
            cache.record_path(&key),
            r#"{"query":"q","timestamp":1.0}"#,
        )
        .unwrap();
        assert!(cache.get("q", "c").is_none());
    }

    #[test]
    fn test_ttl_expires_disk_record() {
        let tmp = TempDir::new().unwrap();
        let cache = test_cache(&tmp).with_ttl(Some(60));
        let key = ResponseCache::cache_key("q", "c");
        let stale = CacheRecord {
            query: "q".into(),
            response: "old".into(),
            timestamp: now_secs() - 3600.0,
        };
        std::fs::write(
            cache.record_path(&key),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();
        assert!(cache.get("q", "c").is_none());
    }

    #[test]
    fn test_ttl_keeps_fresh_record() {
        let tmp = TempDir::new().unwrap();
        let cache = test_cache(&tmp).with_ttl(Some(3600));
        cache.set("q", "c", "fresh");
        cache.clear_memory();
        assert_eq!(cache.get("q", "c"), Some("fresh".into()));
    }

    #[test]
    fn test_clear_memory_keeps_disk() {
        let tmp = TempDir::new().unwrap();
        let cache = test_cache(&tmp);
        cache.set("q", "c", "r");
        assert_eq!(cache.len(), 1);
        cache.clear_memory();
        assert!(cache.is_empty());
        assert_eq!(cache.get("q", "c"), Some("r".into()));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let cache = test_cache(&tmp);
        cache.set("a", "1", "x");
        cache.set("b", "2", "y");
        let names: Vec<String> = std::fs::read_dir(cache.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2, "only the two records: {:?}", names);
        assert!(names.iter().all(|n| n.ends_with(".json")));
    }

    #[test]
    fn test_from_config_resolves_against_root() {
        let tmp = TempDir::new().unwrap();
        let cfg = CacheConfig {
            enabled: true,
            dir: PathBuf::from("cache/responses"),
            ttl_secs: Some(10),
        };
        let cache = ResponseCache::from_config(tmp.path(), &cfg);
        assert_eq!(cache.dir(), tmp.path().join("cache/responses").as_path());
        assert!(cache.dir().is_dir());
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(test_cache(&tmp));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.set(&format!("q{i}"), "c", &format!("r{i}"));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..4 {
            assert_eq!(cache.get(&format!("q{i}"), "c"), Some(format!("r{i}")));
        }
    }
}
