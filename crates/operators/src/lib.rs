//! Operators: pluggable analysis passes and the concurrent runner
//!
//! This crate provides:
//! - The `Operator` contract every analysis pass implements
//! - Target discovery (`.gitignore` aware)
//! - Built-in operators for Python and Rust sources (`raw`, `cyclomatic`, `maintainability`)
//! - The concurrent runner that merges per-operator outcomes into a `RunResult`

pub mod cyclomatic;
pub mod discover;
pub mod maintainability;
pub mod raw;
pub mod runner;
pub mod source;

pub use discover::{file_key, Targets};
pub use runner::run_operators;

use anyhow::Result;
use source::{Language, Source};
use std::path::Path;
use tm_core::{AnalysisConfig, FileMetrics, OperatorLevel, OperatorOutput, OperatorSpec, Registry, RegistryError};

/// An analysis pass over a set of files
///
/// Operators share no mutable state; the runner calls `run` from its own
/// thread for each operator.
pub trait Operator: Send + Sync {
    /// Name, level and declared metrics
    fn spec(&self) -> &OperatorSpec;

    fn level(&self) -> OperatorLevel {
        self.spec().level
    }

    /// Whether this operator measures `path`
    fn accepts(&self, path: &Path) -> bool {
        Language::detect(path).is_some()
    }

    /// Measure every accepted file in `targets`
    fn run(&self, targets: &Targets, config: &AnalysisConfig) -> Result<OperatorOutput>;
}

/// Run `measure` over every accepted, readable source file
///
/// Files that cannot be read or decoded are left out of the output; the
/// remaining files are still measured.
pub(crate) fn measure_sources<F>(operator: &dyn Operator, targets: &Targets, mut measure: F) -> Result<OperatorOutput>
where
    F: FnMut(&Source) -> FileMetrics,
{
    let mut output = OperatorOutput::new();
    for rel in targets.files.iter().filter(|f| operator.accepts(f)) {
        match Source::load(&targets.root, rel) {
            Ok(Some(source)) => {
                output.insert(file_key(rel), measure(&source));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    operator = %operator.spec().name,
                    path = %rel.display(),
                    "skipping unreadable file: {:#}",
                    e
                );
            }
        }
    }
    Ok(output)
}

/// Every built-in operator, in name order
pub fn builtin_operators() -> Vec<Box<dyn Operator>> {
    vec![
        Box::new(cyclomatic::Cyclomatic::new()),
        Box::new(maintainability::Maintainability::new()),
        Box::new(raw::Raw::new()),
    ]
}

/// Registry holding the specs of every built-in operator
pub fn builtin_registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    for operator in builtin_operators() {
        registry.register(operator.spec().clone())?;
    }
    Ok(registry)
}

/// Instantiate the named built-in operators
pub fn select_operators(names: &[String]) -> Result<Vec<Box<dyn Operator>>, RegistryError> {
    let mut available = builtin_operators();
    let mut selected = Vec::new();
    for name in names {
        if selected.iter().any(|op: &Box<dyn Operator>| op.spec().name == *name) {
            continue;
        }
        let pos = available
            .iter()
            .position(|op| op.spec().name == *name)
            .ok_or_else(|| RegistryError::UnknownOperator(name.clone()))?;
        selected.push(available.remove(pos));
    }
    Ok(selected)
}
