//! Error types for the narrator library.

use thiserror::Error;

/// Errors produced by the narrator library.
#[derive(Debug, Error)]
pub enum NarratorError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure for cache records, metadata, or chunk files.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse failure in `config.yaml`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid or inconsistent configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chunk parameters that would never advance the window.
    #[error("Invalid chunking: chunk_size={chunk_size}, overlap={overlap} (overlap must be smaller than a non-zero chunk_size)")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    /// File extension the extractor does not handle.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Text extraction failed for a recognised format.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Narrative generator failure.
    #[error("Generator error: {0}")]
    Generator(String),
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, NarratorError>;
