//! Revision index errors

use thiserror::Error;
use tm_core::MetricNotFound;

#[derive(Debug, Error)]
pub enum IndexError {
    /// No build has run for this archiver yet
    #[error("no revisions indexed for archiver '{archiver}'; run `tm build` first")]
    EmptyIndex { archiver: String },

    #[error("revision {key} is not in the '{archiver}' index")]
    RevisionNotFound { archiver: String, key: String },

    /// Entries are immutable; a revision can only be appended once
    #[error("revision {key} is already indexed for archiver '{archiver}'")]
    DuplicateAppend { archiver: String, key: String },

    #[error(transparent)]
    MetricNotFound(#[from] MetricNotFound),

    #[error("corrupt index entry: {0}")]
    Corrupt(String),

    #[error("index storage error: {0}")]
    Storage(#[from] sled::Error),
}
