//! Project configuration (`tidemark.toml`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the project root
pub const DEFAULT_CONFIG_FILE: &str = "tidemark.toml";

/// Default cache directory, relative to the project root
pub const DEFAULT_CACHE_DIR: &str = ".tidemark";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project root; set from the command line, never read from the file
    #[serde(skip)]
    pub path: PathBuf,

    /// Archiver used by `build` (git or filesystem)
    pub archiver: String,

    /// Operators run by `build` and `diff`
    pub operators: Vec<String>,

    /// Maximum number of historical revisions to index
    pub max_revisions: usize,

    /// Paths (relative to the root) to analyse; empty means everything
    pub targets: Vec<PathBuf>,

    /// Override for the cache directory
    pub cache_path: Option<PathBuf>,

    pub analysis: AnalysisConfig,
}

/// Settings handed to every operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Files larger than this are skipped
    pub max_file_bytes: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            archiver: "git".to_string(),
            operators: vec![
                "cyclomatic".to_string(),
                "maintainability".to_string(),
                "raw".to_string(),
            ],
            max_revisions: 50,
            targets: Vec::new(),
            cache_path: None,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `file`, falling back to defaults when it does not exist
    pub fn load(file: &Path) -> Result<Self> {
        if !file.exists() {
            tracing::debug!(path = %file.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read config file {}", file.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", file.display()))?;
        config.validate().context("Invalid configuration")?;

        tracing::debug!(path = %file.display(), "loaded configuration");
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.archiver.trim().is_empty() {
            anyhow::bail!("archiver must not be empty");
        }
        if self.operators.is_empty() {
            anyhow::bail!("at least one operator must be configured");
        }
        if !(1..=100_000).contains(&self.max_revisions) {
            anyhow::bail!(
                "max_revisions must be between 1 and 100,000 (got {})",
                self.max_revisions
            );
        }
        if !(1024..=64 * 1024 * 1024).contains(&self.analysis.max_file_bytes) {
            anyhow::bail!(
                "analysis.max_file_bytes must be between 1 KiB and 64 MiB (got {})",
                self.analysis.max_file_bytes
            );
        }
        for target in &self.targets {
            if target.is_absolute() {
                anyhow::bail!("targets must be relative to the project root: {}", target.display());
            }
        }
        Ok(())
    }

    /// Resolved cache directory
    pub fn cache_dir(&self) -> PathBuf {
        match &self.cache_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.path.join(p),
            None => self.path.join(DEFAULT_CACHE_DIR),
        }
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let config = Config::load(&temp_dir.path().join(DEFAULT_CONFIG_FILE))?;
        assert_eq!(config, Config::default());
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let file = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &file,
            "archiver = \"filesystem\"\nmax_revisions = 5\n\n[analysis]\nmax_file_bytes = 4096\n",
        )?;

        let config = Config::load(&file)?;
        assert_eq!(config.archiver, "filesystem");
        assert_eq!(config.max_revisions, 5);
        assert_eq!(config.analysis.max_file_bytes, 4096);
        assert_eq!(config.operators, Config::default().operators);
        Ok(())
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = Config::default();
        config.max_revisions = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.operators.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.targets.push(PathBuf::from("/abs"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_dir_resolution() {
        let mut config = Config {
            path: PathBuf::from("/work/project"),
            ..Config::default()
        };
        assert_eq!(config.cache_dir(), PathBuf::from("/work/project/.tidemark"));

        config.cache_path = Some(PathBuf::from("cache"));
        assert_eq!(config.cache_dir(), PathBuf::from("/work/project/cache"));

        config.cache_path = Some(PathBuf::from("/tmp/tm"));
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/tm"));
    }

    #[test]
    fn test_toml_roundtrip_skips_path() -> Result<()> {
        let config = Config {
            path: PathBuf::from("/somewhere"),
            ..Config::default()
        };
        let text = config.to_toml()?;
        assert!(!text.contains("somewhere"));
        let parsed: Config = toml::from_str(&text)?;
        assert_eq!(parsed.operators, config.operators);
        Ok(())
    }
}
