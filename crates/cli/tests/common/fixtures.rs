//! Throwaway projects for end-to-end tests

use anyhow::Result;
use git2::{Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

/// Config for projects without version control
const FILESYSTEM_CONFIG: &str = r#"archiver = "filesystem"
operators = ["cyclomatic", "maintainability", "raw"]
"#;

/// Config for git projects; the cache and the config itself stay untracked
const GIT_CONFIG: &str = r#"archiver = "git"
operators = ["cyclomatic", "maintainability", "raw"]
"#;

/// One branch, file complexity 2
pub const APP_V1: &str = r#"def check(x):
    if x > 0:
        return "positive"
    return "other"
"#;

/// `check` gains an `elif` (3) plus `helper` (1): file complexity 4
pub const APP_V2: &str = r#"def check(x):
    if x > 0:
        return "positive"
    elif x < 0:
        return "negative"
    return "zero"


def helper(items):
    return len(items)
"#;

/// `check` gains an `and` (4), `helper` unchanged: file complexity 5
pub const APP_V3: &str = r#"def check(x):
    if x > 0 and x < 100:
        return "positive"
    elif x < 0:
        return "negative"
    return "zero"


def helper(items):
    return len(items)
"#;

/// A temporary project using the filesystem archiver
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Project with `tidemark.toml` and `app.py` at [`APP_V1`]
    pub fn new() -> Result<Self> {
        let project = Self {
            dir: tempfile::tempdir()?,
        };
        project.write("tidemark.toml", FILESYSTEM_CONFIG)?;
        project.write("app.py", APP_V1)?;
        Ok(project)
    }

    /// Git repository with `tidemark.toml` and no commits yet
    pub fn with_git() -> Result<Self> {
        let project = Self {
            dir: tempfile::tempdir()?,
        };
        Repository::init(project.path())?;
        project.write("tidemark.toml", GIT_CONFIG)?;
        Ok(project)
    }

    /// Write `rel` and commit it on HEAD at `time` (unix seconds)
    pub fn commit(&self, rel: &str, content: &str, message: &str, time: i64) -> Result<()> {
        self.write(rel, content)?;

        let repo = Repository::open(self.path())?;
        let mut index = repo.index()?;
        index.add_path(Path::new(rel))?;
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;
        let sig = Signature::new("Ada", "ada@example.com", &Time::new(time, 0))?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<_> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) -> Result<()> {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn cache_dir(&self) -> std::path::PathBuf {
        self.dir.path().join(".tidemark")
    }
}
