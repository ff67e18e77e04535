//! Cache stats, list, and clear command handlers.

use std::path::Path;

use anyhow::Result;

use narrator::cache::{format_timestamp, CacheListing, CacheManager, CacheStats};
use narrator::config::Config;

use super::{resolve, rule, CacheAction};

/// Handle `narrator cache` subcommands.
pub(crate) fn cmd_cache(action: CacheAction, root: &Path, config: &Config) -> Result<()> {
    let manager = CacheManager::new(resolve(root, &config.cache.dir));

    match action {
        CacheAction::Stats => print!("{}", render_stats(&manager.stats())),
        CacheAction::List { limit } => print!("{}", render_listing(&manager.list(limit), limit)),
        CacheAction::Clear { days } => {
            let cleared = manager.clear(days);
            println!("Cleared {} cache file(s)", cleared);
        }
    }

    Ok(())
}

fn render_stats(stats: &CacheStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", rule()));
    out.push_str("Cache Statistics\n");
    out.push_str(&format!("{}\n", rule()));
    out.push_str(&format!("Total cache files: {}\n", stats.total_files));
    out.push_str(&format!("Total cache size: {:.2} MB\n", stats.total_size_mb()));
    if let (Some(oldest), Some(newest)) = (stats.oldest(), stats.newest()) {
        out.push_str(&format!("Oldest entry: {}\n", format_timestamp(oldest.timestamp)));
        out.push_str(&format!("Newest entry: {}\n", format_timestamp(newest.timestamp)));
    }
    out.push_str(&format!("{}\n", rule()));
    out
}

fn render_listing(listing: &CacheListing, limit: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", rule()));
    out.push_str(&format!("Cache Entries (showing up to {})\n", limit));
    out.push_str(&format!("{}\n", rule()));
    for entry in &listing.entries {
        let when = entry
            .timestamp
            .map(format_timestamp)
            .unwrap_or_else(|| "N/A".to_string());
        out.push_str(&format!("{:20} | {:19} | {}\n", entry.file, when, entry.query));
    }
    if listing.remaining() > 0 {
        out.push_str(&format!("\n... and {} more entries\n", listing.remaining()));
    }
    out.push_str(&format!("{}\n", rule()));
    out
}
