//! Show the indexed revisions

use crate::cmd::setup;
use crate::{util, GlobalOpts};
use anyhow::Result;
use owo_colors::OwoColorize;

const MESSAGE_WIDTH: usize = 50;

pub async fn run(opts: &GlobalOpts, include_message: bool) -> Result<()> {
    // 1. Open cache
    let config = util::load_config(opts)?;
    setup::ensure_cache(opts, &config).await?;
    let cache = util::Cache::open(&config)?;
    let index = cache.indexed(&config)?;

    // 2. Read every entry, newest first
    let entries = index.history(index.len())?;

    // 3. Display
    println!(
        "{} ({} revisions, archiver {})",
        "Revision Index".bold(),
        entries.len(),
        index.name().cyan()
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for entry in &entries {
        let revision = &entry.revision;
        print!(
            "{}  {}  {:<20}",
            revision.short_key().yellow(),
            util::format_date(revision.timestamp).dimmed(),
            revision.author_name
        );
        if include_message {
            print!("  {}", revision.summary(MESSAGE_WIDTH));
        }
        if !entry.unavailable.is_empty() {
            let missing: Vec<&str> = entry.unavailable.iter().map(String::as_str).collect();
            print!("  {}", format!("(unavailable: {})", missing.join(", ")).red());
        }
        println!();
    }

    if let Some(latest) = entries.first() {
        println!();
        println!(
            "Latest:  {} ({})",
            latest.revision.short_key(),
            util::format_relative_time(latest.revision.timestamp)
        );
    }
    println!(
        "Cache:   {} ({})",
        cache.store.root().display(),
        util::format_size(util::calculate_dir_size(cache.store.root())?)
    );

    Ok(())
}
