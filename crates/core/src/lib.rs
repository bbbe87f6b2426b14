//! Tidemark core - shared model for the revision-indexed metrics cache
//!
//! This crate provides:
//! - Metric and operator catalog (explicit `Registry`)
//! - Typed metric values and per-run results
//! - Revision identity
//! - Delta engine (type-aware comparison and classification)
//! - Configuration and cache directory layout
//! - BLAKE3 hashing for content-addressed keys

pub mod config;
pub mod delta;
pub mod hash;
pub mod metric;
pub mod registry;
pub mod results;
pub mod revision;
pub mod store;

// Re-export main types for convenience
pub use config::{AnalysisConfig, Config};
pub use delta::{compare, DeltaResult, Direction, Style, PLACEHOLDER};
pub use hash::{hash_bytes, hash_file, Blake3Hash, SnapshotHasher};
pub use metric::{Aim, Metric, MetricKind, MetricValue};
pub use registry::{OperatorLevel, OperatorSpec, Registry, RegistryError};
pub use results::{FileMetrics, MetricMap, MetricNotFound, OperatorOutcome, OperatorOutput, RunResult};
pub use revision::Revision;
pub use store::Store;

/// Common result type used throughout tidemark-core
pub type Result<T> = anyhow::Result<T>;
