//! Guided setup when a read command finds no cache
//!
//! Interactive terminals are offered a first build; scripts and pipes fall
//! through to the usual "run `tm build` first" error.

use crate::cmd::build;
use crate::{util, GlobalOpts};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::PathBuf;
use tm_core::store::atomic_write;
use tm_core::{Config, Store};

pub async fn ensure_cache(opts: &GlobalOpts, config: &Config) -> Result<()> {
    // 1. Nothing to do when the cache exists or nobody can answer
    if Store::exists(&config.cache_dir()) || !std::io::stdin().is_terminal() {
        return Ok(());
    }

    eprintln!(
        "{} No tidemark cache found at {}",
        "Warning:".yellow().bold(),
        config.cache_dir().display()
    );
    if !util::confirm("Do you want to run setup and index your project now?")? {
        return Ok(());
    }

    // 2. Ask for the build scope
    let revisions = util::prompt(&format!(
        "How many previous revisions do you want to index? [{}]",
        config.max_revisions
    ))?;
    let paths = util::prompt("Which paths do you want to analyse, separated by commas? [everything]")?;
    let (max_revisions, targets) = parse_answers(&revisions, &paths, config.max_revisions)?;

    // 3. Save the answers unless a config file already exists
    let file = util::config_file(opts, &config.path)?;
    if !file.exists() {
        let mut saved = config.clone();
        saved.max_revisions = max_revisions;
        saved.targets = targets
            .iter()
            .map(|t| util::normalize_target(&config.path, t))
            .collect::<Result<_>>()?;
        atomic_write(&file, saved.to_toml()?.as_bytes())?;
        println!("Configuration saved to {}", file.display().to_string().cyan());
    }

    // 4. First build
    build::run(opts, targets, Some(max_revisions), None, None).await
}

/// Parse the setup answers; blank answers keep the defaults
pub fn parse_answers(revisions: &str, paths: &str, default_revisions: usize) -> Result<(usize, Vec<PathBuf>)> {
    let revisions = revisions.trim();
    let max_revisions = if revisions.is_empty() {
        default_revisions
    } else {
        revisions
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .with_context(|| format!("'{}' is not a positive number of revisions", revisions))?
    };

    let targets = paths
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect();

    Ok((max_revisions, targets))
}
