//! Delete the cache directory

use crate::{util, GlobalOpts};
use anyhow::Result;
use owo_colors::OwoColorize;
use tm_core::Store;

pub async fn run(opts: &GlobalOpts, yes: bool) -> Result<()> {
    // 1. Locate cache
    let config = util::load_config(opts)?;
    let cache_dir = config.cache_dir();
    if !Store::exists(&cache_dir) {
        println!("{}", "No tidemark cache found, nothing to remove".dimmed());
        return Ok(());
    }

    // 2. Confirm
    let size = util::calculate_dir_size(&cache_dir)?;
    if !yes && !util::confirm(&format!("Delete the tidemark cache at {}?", cache_dir.display()))? {
        println!("Aborted");
        return Ok(());
    }

    // 3. Remove, unless a build is running
    let store = Store::open(&cache_dir)?;
    let _lock = crate::locks::BuildLock::acquire(store.root())?;
    store.clean()?;
    tracing::info!(cache = %cache_dir.display(), "removed cache");

    println!(
        "{} {} ({})",
        "Removed".green(),
        cache_dir.display(),
        util::format_size(size)
    );
    Ok(())
}
