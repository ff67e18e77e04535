//! Presentation ingestion: extraction, chunking, cataloguing, and validation.

pub mod catalog;
pub mod chunker;
pub mod extract;
pub mod loader;
pub mod validate;

pub use catalog::{generate_metadata, scan_presentations, MetadataFile, PresentationInfo};
pub use chunker::chunk_text;
pub use extract::{extract_text, Extracted, PresentationFormat};
pub use loader::{load_documents, write_chunks, ChunkFile, LoadedDocument};
pub use validate::{validate_all, validate_presentation_file, Validation, ValidationReport};
