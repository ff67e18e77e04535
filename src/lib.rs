//! Presentation narrator: ingest slide decks, chunk their text, and cache
//! generated narratives on disk.
//!
//! The cache ([`cache::ResponseCache`]) stores one JSON record per
//! `(query, context)` pair; [`cache::CacheManager`] administers the
//! directory. Ingestion lives under [`ingest`], project bootstrap under
//! [`setup`], and [`narrative`] defines the generator seam the cache wraps.

pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod narrative;
pub mod setup;

pub use cache::{CacheManager, ResponseCache};
pub use config::Config;
pub use error::{NarratorError, Result};
pub use narrative::{CachedGenerator, NarrativeGenerator};
