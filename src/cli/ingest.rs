//! Ingest command handler.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use narrator::config::Config;
use narrator::ingest::{load_documents, write_chunks, LoadedDocument, MetadataFile};

use super::resolve;

/// Extract and chunk presentations, write chunk files, and mark them processed.
pub(crate) async fn cmd_ingest(root: &Path, config: &Config, dry_run: bool) -> Result<()> {
    config
        .validate()
        .with_context(|| "Invalid chunking configuration")?;
    let presentations_dir = resolve(root, &config.paths.presentations_dir);
    let chunking = config.chunking;

    // zip/xml/pdf parsing is blocking work.
    let dir = presentations_dir.clone();
    let documents = tokio::task::spawn_blocking(move || load_documents(&dir, &chunking))
        .await
        .with_context(|| "Ingestion task panicked")?
        .with_context(|| format!("Failed to load presentations from {}", presentations_dir.display()))?;

    if documents.is_empty() {
        println!("No readable presentations found in {}", presentations_dir.display());
        return Ok(());
    }

    for doc in &documents {
        println!(
            "- {} ({}) | {} slide(s) | {} chars | {} chunk(s)",
            doc.id,
            doc.format,
            doc.slide_count,
            doc.text_chars,
            doc.chunks.len()
        );
    }

    if dry_run {
        println!("Dry run: no chunk files written.");
        return Ok(());
    }

    let chunks_dir = resolve(root, &config.paths.chunks_dir);
    let written = write_chunks(&documents, &chunks_dir, &chunking)
        .with_context(|| format!("Failed to write chunk files to {}", chunks_dir.display()))?;
    println!("Wrote {} chunk file(s) to {}", written, chunks_dir.display());

    let metadata_path = resolve(root, &config.paths.metadata_path);
    update_catalog(&metadata_path, &documents);
    Ok(())
}

/// Mark ingested documents as processed in the catalog, if one exists.
fn update_catalog(metadata_path: &Path, documents: &[LoadedDocument]) {
    if !metadata_path.exists() {
        return;
    }
    let mut metadata = match MetadataFile::load(metadata_path) {
        Ok(m) => m,
        Err(e) => {
            warn!(path = %metadata_path.display(), "Skipping catalog update: {}", e);
            return;
        }
    };
    let updated = documents
        .iter()
        .filter(|doc| metadata.mark_processed(&doc.file_name(), doc.slide_count))
        .count();
    if updated == 0 {
        return;
    }
    match metadata.save(metadata_path) {
        Ok(()) => println!("Marked {} catalog entries as processed", updated),
        Err(e) => warn!(path = %metadata_path.display(), "Failed to update catalog: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator::ingest::catalog::generate_metadata;
    use narrator::ingest::ChunkFile;
    use std::io::Write;
    use tempfile::TempDir;

    // Single-slide copy of the library fixture, which is cfg(test) there and not visible here.
    fn pptx(text: &str) -> Vec<u8> {
        let mut archive = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        archive.start_file("ppt/slides/slide1.xml", options).unwrap();
        archive
            .write_all(
                format!(r#"<p:sld xmlns:a="a" xmlns:p="p"><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:sld>"#)
                    .as_bytes(),
            )
            .unwrap();
        archive.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_cmd_ingest_writes_chunks_and_updates_catalog() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let dir = tmp.path().join("data/presentations");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("roadmap.pptx"), pptx("Roadmap for next year")).unwrap();
        let metadata_path = tmp.path().join("data/metadata/presentations_metadata.json");
        generate_metadata(&dir, &metadata_path, tmp.path()).unwrap();

        cmd_ingest(tmp.path(), &config, false).await.unwrap();

        let chunk_path = tmp.path().join("data/processed/chunks/roadmap.pptx.json");
        let file: ChunkFile =
            serde_json::from_str(&std::fs::read_to_string(chunk_path).unwrap()).unwrap();
        assert_eq!(file.chunks, vec!["Roadmap for next year\n".to_string()]);

        let meta = MetadataFile::load(&metadata_path).unwrap();
        assert!(meta.presentations[0].processed);
        assert_eq!(meta.presentations[0].slide_count, 1);
    }

    #[tokio::test]
    async fn test_cmd_ingest_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data/presentations");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.pptx"), pptx("Anything at all")).unwrap();

        cmd_ingest(tmp.path(), &Config::default(), true).await.unwrap();
        assert!(!tmp.path().join("data/processed/chunks").exists());
    }

    #[tokio::test]
    async fn test_cmd_ingest_rejects_bad_chunking() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.chunking.overlap = config.chunking.chunk_size;
        let err = cmd_ingest(tmp.path(), &config, true).await.unwrap_err();
        assert!(err.to_string().contains("chunking"));
    }
}
