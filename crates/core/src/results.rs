//! Operator outputs and merged run results

use crate::metric::MetricValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Metric name -> value
pub type MetricMap = BTreeMap<String, MetricValue>;

/// Everything one operator measured for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    /// File level values
    pub total: MetricMap,
    /// Per function/class values, keyed by object name (object-level operators only)
    pub detailed: BTreeMap<String, MetricMap>,
}

impl FileMetrics {
    pub fn with_total(total: MetricMap) -> Self {
        Self {
            total,
            detailed: BTreeMap::new(),
        }
    }
}

/// File path -> metrics, as produced by one operator
pub type OperatorOutput = BTreeMap<String, FileMetrics>;

/// Why a metric could not be found
///
/// Each variant drives different fallback rendering, so callers match on them
/// instead of treating every miss the same.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetricNotFound {
    #[error("revision {key} is not indexed")]
    RevisionNotIndexed { key: String },

    #[error("operator '{operator}' was not run")]
    OperatorNotRun { operator: String },

    #[error("file '{file}' has no '{operator}' data")]
    FileAbsent { operator: String, file: String },

    #[error("'{object}' not found in '{file}'")]
    ObjectAbsent { file: String, object: String },

    #[error("metric '{metric}' absent")]
    MetricAbsent { metric: String },
}

/// Look up a value inside one operator's output
///
/// `object` selects an entry of the nested detail mapping.
pub fn lookup<'a>(
    output: &'a OperatorOutput,
    operator: &str,
    file: &str,
    object: Option<&str>,
    metric: &str,
) -> Result<&'a MetricValue, MetricNotFound> {
    let file_metrics = output.get(file).ok_or_else(|| MetricNotFound::FileAbsent {
        operator: operator.to_string(),
        file: file.to_string(),
    })?;

    let values = match object {
        None => &file_metrics.total,
        Some(object) => file_metrics
            .detailed
            .get(object)
            .ok_or_else(|| MetricNotFound::ObjectAbsent {
                file: file.to_string(),
                object: object.to_string(),
            })?,
    };

    values.get(metric).ok_or_else(|| MetricNotFound::MetricAbsent {
        metric: metric.to_string(),
    })
}

/// Result of one operator within a run
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorOutcome {
    Completed(OperatorOutput),
    /// The operator failed; its data is absent for this run
    Unavailable { reason: String },
}

/// Merged output of every operator in a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    outcomes: BTreeMap<String, OperatorOutcome>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, operator: impl Into<String>, outcome: OperatorOutcome) {
        self.outcomes.insert(operator.into(), outcome);
    }

    pub fn outcome(&self, operator: &str) -> Option<&OperatorOutcome> {
        self.outcomes.get(operator)
    }

    /// Output of a completed operator
    pub fn output(&self, operator: &str) -> Option<&OperatorOutput> {
        match self.outcomes.get(operator) {
            Some(OperatorOutcome::Completed(output)) => Some(output),
            _ => None,
        }
    }

    pub fn completed(&self) -> impl Iterator<Item = (&String, &OperatorOutput)> {
        self.outcomes.iter().filter_map(|(name, outcome)| match outcome {
            OperatorOutcome::Completed(output) => Some((name, output)),
            OperatorOutcome::Unavailable { .. } => None,
        })
    }

    pub fn unavailable(&self) -> impl Iterator<Item = (&String, &str)> {
        self.outcomes.iter().filter_map(|(name, outcome)| match outcome {
            OperatorOutcome::Unavailable { reason } => Some((name, reason.as_str())),
            OperatorOutcome::Completed(_) => None,
        })
    }

    /// True when at least one operator produced data
    pub fn has_data(&self) -> bool {
        self.completed().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn metric(
        &self,
        operator: &str,
        file: &str,
        object: Option<&str>,
        metric: &str,
    ) -> Result<&MetricValue, MetricNotFound> {
        let output = self.output(operator).ok_or_else(|| MetricNotFound::OperatorNotRun {
            operator: operator.to_string(),
        })?;
        lookup(output, operator, file, object, metric)
    }

    /// Split into completed outputs and the names of unavailable operators
    pub fn into_parts(self) -> (BTreeMap<String, OperatorOutput>, BTreeSet<String>) {
        let mut completed = BTreeMap::new();
        let mut unavailable = BTreeSet::new();
        for (name, outcome) in self.outcomes {
            match outcome {
                OperatorOutcome::Completed(output) => {
                    completed.insert(name, output);
                }
                OperatorOutcome::Unavailable { .. } => {
                    unavailable.insert(name);
                }
            }
        }
        (completed, unavailable)
    }
}
