//! Shared utilities for CLI commands

use crate::GlobalOpts;
use anyhow::{Context, Result};
use archiver::resolve_archiver;
use chrono::{DateTime, Local, TimeZone, Utc};
use journal::{ArchiverIndex, Index, IndexError, RevisionEntry};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tm_core::config::DEFAULT_CONFIG_FILE;
use tm_core::store::normalize_path;
use tm_core::{Config, Store};

/// Shortest revision prefix matched against indexed keys
const MIN_PREFIX_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("revision prefix '{prefix}' matches {count} indexed revisions")]
    Ambiguous { prefix: String, count: usize },

    #[error("revision '{reference}' ({key}) is not in the cache; run `tm build` first")]
    NotIndexed { reference: String, key: String },
}

/// Project root from `--path`, else the current directory
pub fn project_root(opts: &GlobalOpts) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let root = match &opts.path {
        Some(path) => cwd.join(path),
        None => cwd,
    };
    root.canonicalize()
        .with_context(|| format!("Project root {} does not exist", root.display()))
}

/// Load `tidemark.toml` and apply the global command line overrides
pub fn load_config(opts: &GlobalOpts) -> Result<Config> {
    let root = project_root(opts)?;
    let file = config_file(opts, &root)?;

    let mut config = Config::load(&file)?;
    config.path = root;
    if let Some(cache) = &opts.cache {
        config.cache_path = Some(std::env::current_dir()?.join(cache));
    }
    tracing::debug!(root = %config.path.display(), cache = %config.cache_dir().display(), "configuration ready");
    Ok(config)
}

/// `--config`, else `tidemark.toml` in the project root
pub fn config_file(opts: &GlobalOpts, root: &Path) -> Result<PathBuf> {
    Ok(match &opts.config {
        Some(file) => std::env::current_dir()?.join(file),
        None => root.join(DEFAULT_CONFIG_FILE),
    })
}

/// Cache directory when it already exists; used to decide on file logging
pub fn existing_cache_dir(opts: &GlobalOpts) -> Option<PathBuf> {
    let config = load_config(opts).ok()?;
    let dir = config.cache_dir();
    Store::exists(&dir).then_some(dir)
}

/// An opened cache: directory layout plus revision index
pub struct Cache {
    pub store: Store,
    pub index: Index,
}

impl Cache {
    /// Open the cache for `config`; fails with a "run `tm build` first" hint when missing
    pub fn open(config: &Config) -> Result<Self> {
        let store = Store::open(&config.cache_dir())?;
        let index = Index::open(&store.index_dir()).context("Failed to open revision index")?;
        Ok(Self { store, index })
    }

    /// Index of the configured archiver; fails when nothing has been built yet
    pub fn indexed(&self, config: &Config) -> Result<ArchiverIndex> {
        let index = self.index.archiver(&config.archiver)?;
        if index.is_empty() {
            let err = anyhow::Error::from(IndexError::EmptyIndex {
                archiver: config.archiver.clone(),
            });
            let others = self.populated_archivers()?;
            if others.is_empty() {
                return Err(err);
            }
            return Err(err.context(format!(
                "nothing indexed for archiver '{}', but the cache has revisions for {}; set `archiver` in {}",
                config.archiver,
                others.join(", "),
                DEFAULT_CONFIG_FILE
            )));
        }
        Ok(index)
    }

    /// Archivers with at least one indexed revision
    pub fn populated_archivers(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for name in self.index.archivers() {
            if !self.index.archiver(&name)?.is_empty() {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// Find the indexed entry for a user supplied revision reference
///
/// `None` means the last indexed revision. Otherwise, in order: an exact
/// indexed key, a unique indexed key prefix, then whatever the archiver
/// resolves the reference to (branch names, `HEAD~2`, ...).
pub fn resolve_entry(
    config: &Config,
    cache: &Cache,
    index: &ArchiverIndex,
    reference: Option<&str>,
) -> Result<RevisionEntry> {
    let Some(reference) = reference else {
        return Ok(index.last_revision()?);
    };

    if index.contains(reference) {
        return Ok(index.lookup_revision(reference)?);
    }

    if reference.len() >= MIN_PREFIX_LEN {
        let matches: Vec<String> = index
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(reference))
            .collect();
        match matches.len() {
            0 => {}
            1 => return Ok(index.lookup_revision(&matches[0])?),
            count => {
                return Err(LookupError::Ambiguous {
                    prefix: reference.to_string(),
                    count,
                }
                .into())
            }
        }
    }

    let archiver = resolve_archiver(&config.archiver, config, &cache.store.checkout_dir())?;
    let revision = archiver.resolve(reference)?;
    tracing::debug!(reference, key = %revision.key, "resolved revision");

    if !index.contains(&revision.key) {
        return Err(LookupError::NotIndexed {
            reference: reference.to_string(),
            key: revision.key,
        }
        .into());
    }
    Ok(index.lookup_revision(&revision.key)?)
}

/// Path argument relative to the project root, `/`-separated
pub fn normalize_target(root: &Path, path: &Path) -> Result<PathBuf> {
    let relative = if path.is_absolute() {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        canonical
            .strip_prefix(root)
            .with_context(|| format!("{} is outside the project root", path.display()))?
            .to_path_buf()
    } else {
        path.to_path_buf()
    };
    normalize_path(&relative)
}

/// Whether `file` is `prefix` or lies below it; an empty prefix matches everything
pub fn is_under(file: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || file == prefix
        || file
            .strip_prefix(prefix)
            .map_or(false, |rest| rest.starts_with('/'))
}

/// Output file argument; relative paths resolve against the project root
pub fn resolve_output(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// HTML page location: an `.html` path as given, any other path is a
/// directory receiving `index.html`, and `default_dir` when absent
pub fn html_output_path(root: &Path, output: Option<&Path>, default_dir: &str) -> PathBuf {
    let target = match output {
        Some(path) if path.extension().map_or(false, |e| e == "html") => path.to_path_buf(),
        Some(dir) => dir.join("index.html"),
        None => Path::new(default_dir).join("index.html"),
    };
    resolve_output(root, &target)
}

/// Print `question` and read one trimmed line from stdin
pub fn prompt(question: &str) -> Result<String> {
    print!("{} ", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Ask a yes/no question on stdin; anything but `y` means no
pub fn confirm(question: &str) -> Result<bool> {
    Ok(prompt(&format!("{} [y/N]", question))?.eq_ignore_ascii_case("y"))
}

/// Format unix seconds as a local date ("2024-01-03 14:30")
pub fn format_date(ts_secs: i64) -> String {
    match Local.timestamp_opt(ts_secs, 0).single() {
        Some(date) => date.format("%Y-%m-%d %H:%M").to_string(),
        None => ts_secs.to_string(),
    }
}

/// Format unix seconds as relative time ("2 hours ago")
pub fn format_relative_time(ts_secs: i64) -> String {
    let Some(then) = DateTime::<Utc>::from_timestamp(ts_secs, 0) else {
        return ts_secs.to_string();
    };
    let seconds = (Utc::now() - then).num_seconds();

    if seconds < 0 {
        "in the future".to_string()
    } else if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604800 {
        format!("{} days ago", seconds / 86400)
    } else {
        format!("{} weeks ago", seconds / 604800)
    }
}

/// Format file size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Total size of every file below `dir`
pub fn calculate_dir_size(dir: &Path) -> Result<u64> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut total = 0u64;
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            total += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }
    Ok(total)
}
