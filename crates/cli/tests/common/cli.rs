//! Runs the `tm` binary inside a test project

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One `tm` invocation
pub struct TmCommand {
    dir: PathBuf,
    args: Vec<OsString>,
}

impl TmCommand {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(OsString::from));
        self
    }

    /// Run to completion with stdin closed
    pub fn execute(&self) -> Result<Output> {
        let output = Command::new(env!("CARGO_BIN_EXE_tm"))
            .args(&self.args)
            .current_dir(&self.dir)
            .env_remove("RUST_LOG")
            .stdin(std::process::Stdio::null())
            .output()
            .context("Failed to spawn tm")?;

        Ok(Output {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }

    pub fn assert_success(&self) -> Result<Output> {
        let output = self.execute()?;
        if !output.success() {
            anyhow::bail!("tm {:?} exited with {:?}\n{}", self.args, output.code, output);
        }
        Ok(output)
    }

    pub fn assert_failure(&self) -> Result<Output> {
        let output = self.execute()?;
        if output.success() {
            anyhow::bail!("tm {:?} should have failed\n{}", self.args, output);
        }
        Ok(output)
    }
}

/// Captured result of a finished `tm` process
#[derive(Debug, Clone)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
    /// `None` when killed by a signal
    pub code: Option<i32>,
}

impl Output {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- stdout\n{}", self.stdout)?;
        write!(f, "--- stderr\n{}", self.stderr)
    }
}

/// `tm!(dir, "build", "-n", "5")` builds a [`TmCommand`]
#[macro_export]
macro_rules! tm {
    ($dir:expr $(, $arg:expr)* $(,)?) => {{
        let mut cmd = $crate::common::cli::TmCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}
