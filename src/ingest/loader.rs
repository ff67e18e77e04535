//! Document loading: scan, extract, chunk, and persist chunk files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::chunker::chunk_with;
use super::extract::{extract_text, PresentationFormat};
use crate::config::ChunkingConfig;
use crate::error::{NarratorError, Result};

/// A presentation reduced to chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub id: String,
    pub format: PresentationFormat,
    pub source: PathBuf,
    /// Slides or pages seen during extraction.
    pub slide_count: usize,
    pub text_chars: usize,
    pub chunks: Vec<String>,
}

impl LoadedDocument {
    /// Source file name, e.g. `deck.pptx`. Unique within one directory.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.{}", self.id, self.format))
    }

    /// Chunk file name, keyed by the full source file name so decks that
    /// share a stem (`deck.pdf`, `deck.pptx`) do not overwrite each other.
    pub fn chunk_file_name(&self) -> String {
        format!("{}.json", self.file_name())
    }
}

/// On-disk form of a document's chunks (`<chunks_dir>/<file name>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkFile {
    pub id: String,
    pub source: String,
    pub format: String,
    pub chunk_size: usize,
    pub overlap: usize,
    pub chunks: Vec<String>,
}

/// Extract and chunk every presentation directly inside `dir`.
///
/// Files that fail extraction are logged and skipped. A missing directory
/// yields an empty list. Invalid chunk parameters fail before any file is read.
pub fn load_documents(dir: &Path, chunking: &ChunkingConfig) -> Result<Vec<LoadedDocument>> {
    if chunking.chunk_size == 0 || chunking.overlap >= chunking.chunk_size {
        return Err(NarratorError::InvalidChunking {
            chunk_size: chunking.chunk_size,
            overlap: chunking.overlap,
        });
    }

    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "Presentations directory does not exist");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut paths: Vec<(PathBuf, PresentationFormat)> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| PresentationFormat::from_path(&path).map(|f| (path, f)))
        .collect();
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    let mut documents = Vec::with_capacity(paths.len());
    for (path, format) in paths {
        let extracted = match extract_text(&path) {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(path = %path.display(), "Skipping presentation: {}", e);
                continue;
            }
        };
        let chunks = chunk_with(&extracted.text, chunking)?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(id = %id, chunks = chunks.len(), "Loaded presentation");
        documents.push(LoadedDocument {
            id,
            format,
            slide_count: extracted.units,
            text_chars: extracted.text.chars().count(),
            chunks,
            source: path,
        });
    }

    info!(count = documents.len(), dir = %dir.display(), "Loaded presentations");
    Ok(documents)
}

/// Write one chunk file per document into `chunks_dir`.
///
/// Returns the number of files actually written. A document whose chunk file
/// name was already used in this batch is logged and skipped.
pub fn write_chunks(
    documents: &[LoadedDocument],
    chunks_dir: &Path,
    chunking: &ChunkingConfig,
) -> Result<usize> {
    std::fs::create_dir_all(chunks_dir)?;
    let mut written = HashSet::new();
    for doc in documents {
        let name = doc.chunk_file_name();
        if written.contains(&name) {
            warn!(
                source = %doc.source.display(),
                file = %name,
                "Chunk file already written in this batch, skipping"
            );
            continue;
        }
        let file = ChunkFile {
            id: doc.id.clone(),
            source: doc.source.to_string_lossy().into_owned(),
            format: doc.format.as_str().to_string(),
            chunk_size: chunking.chunk_size,
            overlap: chunking.overlap,
            chunks: doc.chunks.clone(),
        };
        std::fs::write(chunks_dir.join(&name), serde_json::to_string_pretty(&file)?)?;
        written.insert(name);
    }
    Ok(written.len())
}
