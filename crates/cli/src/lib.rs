//! Tidemark CLI - command layer behind the `tm` binary
//!
//! This crate provides:
//! - One module per subcommand (`cmd::*`)
//! - Build lock serialising concurrent builds against one cache
//! - Console, HTML and JSON renderers for report/diff output
//! - Logging setup (stderr + cache log file)

pub mod cmd;
pub mod locks;
pub mod logging;
pub mod render;
pub mod util;

use std::path::PathBuf;

/// Options shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub debug: bool,
    /// Config file; defaults to `<root>/tidemark.toml`
    pub config: Option<PathBuf>,
    /// Project root; defaults to the current directory
    pub path: Option<PathBuf>,
    /// Cache directory override
    pub cache: Option<PathBuf>,
}
