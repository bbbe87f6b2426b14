//! Revision index and incremental build planning
//!
//! This crate provides:
//! - Revision entries (immutable per-revision metric snapshots)
//! - Append-only, per-archiver revision index (sled embedded DB)
//! - Incremental build planner

pub mod entry;
pub mod error;
pub mod index;
pub mod planner;

// Re-exports
pub use entry::RevisionEntry;
pub use error::IndexError;
pub use index::{ArchiverIndex, Index};
pub use planner::{plan, BuildPlan, BuildProgress, BuildReport, Builder};

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, IndexError>;
