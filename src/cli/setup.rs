//! Project setup command handler.

use std::path::Path;

use anyhow::{Context, Result};

use narrator::setup::{
    create_config_from_example, create_directory_structure, create_initial_metadata,
    verify_structure, FileOutcome, METADATA_PATH,
};

use super::rule;

/// Create the directory layout, initial metadata, and config.yaml under `root`.
pub(crate) fn cmd_setup(root: &Path) -> Result<()> {
    println!("{}", rule());
    println!("Presentation Narrator - Project Setup");
    println!("{}", rule());
    println!();

    println!("Creating directory structure...");
    let dirs = create_directory_structure(root)
        .with_context(|| format!("Failed to create directories under {}", root.display()))?;
    for dir in &dirs {
        println!("  + {}", dir.path.display());
    }
    println!();

    println!("Creating initial files...");
    match create_initial_metadata(root).with_context(|| "Failed to write initial metadata")? {
        FileOutcome::Created => println!("  + Created initial metadata file: {}", METADATA_PATH),
        _ => println!("  ! Metadata file already exists: {}", METADATA_PATH),
    }
    match create_config_from_example(root).with_context(|| "Failed to create config.yaml")? {
        FileOutcome::Created => {
            println!("  + Created config.yaml from example");
            println!("  ! Review config.yaml before running ingestion");
        }
        FileOutcome::AlreadyExists => println!("  ! Config file already exists: config.yaml"),
        FileOutcome::SourceMissing => println!("  - Example config not found: config.yaml.example"),
    }
    println!();

    println!("Verifying project structure...");
    let checks = verify_structure(root);
    for check in &checks {
        let mark = if check.existed { "+" } else { "x" };
        println!("  {} {}", mark, check.path.display());
    }

    if checks.iter().all(|c| c.existed) {
        println!();
        println!("Project structure is ready.");
        println!();
        println!("Next steps:");
        println!("  1. Edit config.yaml");
        println!("  2. Add presentation files to data/presentations/");
        println!("  3. Run: narrator catalog");
    } else {
        println!();
        println!("Some directories are missing. Please check the structure.");
    }
    println!("{}", rule());
    Ok(())
}
