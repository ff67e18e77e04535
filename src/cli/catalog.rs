//! Catalog and validation command handlers.

use std::path::Path;

use anyhow::{Context, Result};

use narrator::config::Config;
use narrator::ingest::catalog::{generate_metadata, validate_data_structure};
use narrator::ingest::validate_all;

use super::{resolve, rule};

/// Ensure the data layout, then scan presentations and write the metadata file.
pub(crate) fn cmd_catalog(root: &Path, config: &Config) -> Result<()> {
    println!("{}", rule());
    println!("Presentation Metadata Generator");
    println!("{}", rule());

    println!("Validating data directory structure...");
    let checks = validate_data_structure(root)
        .with_context(|| format!("Failed to prepare data directories under {}", root.display()))?;
    for check in &checks {
        if check.existed {
            println!("  + Found: {}", check.path.display());
        } else {
            println!("  + Created: {}", check.path.display());
        }
    }
    println!();

    let presentations_dir = resolve(root, &config.paths.presentations_dir);
    let output = resolve(root, &config.paths.metadata_path);
    println!("Scanning presentations directory...");
    let metadata = generate_metadata(&presentations_dir, &output, root)
        .with_context(|| format!("Failed to generate metadata for {}", presentations_dir.display()))?;
    println!("Generated metadata for {} presentation(s)", metadata.total_count);
    println!("Saved to {}", output.display());

    println!();
    println!("{}", rule());
    println!("Summary:");
    println!("  Total presentations: {}", metadata.total_count);
    println!("  Last updated: {}", metadata.last_updated);
    println!("{}", rule());
    Ok(())
}

/// Validate every presentation in the configured directory.
pub(crate) fn cmd_validate(root: &Path, config: &Config) -> Result<()> {
    let dir = resolve(root, &config.paths.presentations_dir);
    let Some(report) = validate_all(&dir) else {
        println!("Directory {} does not exist", dir.display());
        return Ok(());
    };

    println!("{}", rule());
    println!("Validating Presentations");
    println!("{}", rule());

    if report.results.is_empty() {
        println!("No presentation files found in {}", dir.display());
        return Ok(());
    }

    println!();
    println!("Found {} presentation file(s)", report.results.len());
    println!();
    for (path, verdict) in &report.results {
        let mark = if verdict.valid { "+" } else { "x" };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("{} {:40} - {}", mark, name, verdict.message);
    }

    println!();
    println!("{}", rule());
    println!(
        "Summary: {} valid, {} invalid",
        report.valid_count(),
        report.invalid_count()
    );
    println!("{}", rule());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator::ingest::MetadataFile;
    use tempfile::TempDir;

    #[test]
    fn test_cmd_catalog_writes_metadata() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let dir = tmp.path().join("data/presentations");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("kickoff.pdf"), b"%PDF").unwrap();

        cmd_catalog(tmp.path(), &config).unwrap();

        let meta =
            MetadataFile::load(&tmp.path().join("data/metadata/presentations_metadata.json"))
                .unwrap();
        assert_eq!(meta.total_count, 1);
        assert_eq!(meta.presentations[0].title, "Kickoff");
        assert!(tmp.path().join("data/processed/embeddings").is_dir());
    }

    #[test]
    fn test_cmd_validate_missing_dir_is_ok() {
        let tmp = TempDir::new().unwrap();
        assert!(cmd_validate(tmp.path(), &Config::default()).is_ok());
    }
}
