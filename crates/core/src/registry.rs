//! Operator and metric catalog
//!
//! The registry is an explicit value built once at startup and handed to every
//! component that needs to resolve `operator.metric` names. There is no global
//! lookup table.

use crate::metric::{Metric, MetricKind, MetricValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Granularity an operator reports at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorLevel {
    /// One set of values per file
    File,
    /// Per file plus a nested mapping per function/class
    Object,
}

/// Static description of an operator and the metrics it produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSpec {
    pub name: String,
    pub description: String,
    pub level: OperatorLevel,
    /// Declared metrics; the first one is the operator's primary metric
    pub metrics: Vec<Metric>,
}

impl OperatorSpec {
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn primary_metric(&self) -> Option<&Metric> {
        self.metrics.first()
    }
}

/// Registry lookup errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("operator '{operator}' has no metric '{metric}'")]
    UnknownMetric { operator: String, metric: String },

    #[error("metric '{0}' must be written as <operator>.<metric>")]
    MalformedMetricName(String),

    #[error("operator '{0}' is already registered")]
    DuplicateOperator(String),

    #[error("metric '{operator}.{metric}' is declared {expected} but got a {actual} value")]
    KindMismatch {
        operator: String,
        metric: String,
        expected: MetricKind,
        actual: MetricKind,
    },
}

/// Catalog of operators keyed by name
#[derive(Debug, Clone, Default)]
pub struct Registry {
    operators: BTreeMap<String, OperatorSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operator; names must be unique
    pub fn register(&mut self, spec: OperatorSpec) -> Result<(), RegistryError> {
        if self.operators.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateOperator(spec.name));
        }
        self.operators.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn operator(&self, name: &str) -> Result<&OperatorSpec, RegistryError> {
        self.operators
            .get(name)
            .ok_or_else(|| RegistryError::UnknownOperator(name.to_string()))
    }

    pub fn metric(&self, operator: &str, metric: &str) -> Result<&Metric, RegistryError> {
        self.operator(operator)?
            .metric(metric)
            .ok_or_else(|| RegistryError::UnknownMetric {
                operator: operator.to_string(),
                metric: metric.to_string(),
            })
    }

    /// Resolve a dotted `operator.metric` name
    pub fn resolve_metric(&self, dotted: &str) -> Result<(&OperatorSpec, &Metric), RegistryError> {
        let (operator, metric) = dotted
            .split_once('.')
            .filter(|(op, m)| !op.is_empty() && !m.is_empty())
            .ok_or_else(|| RegistryError::MalformedMetricName(dotted.to_string()))?;
        let spec = self.operator(operator)?;
        let metric = self.metric(operator, metric)?;
        Ok((spec, metric))
    }

    /// Verify a value matches the kind its metric was declared with
    pub fn check_value(
        &self,
        operator: &str,
        metric: &str,
        value: &MetricValue,
    ) -> Result<(), RegistryError> {
        let declared = self.metric(operator, metric)?;
        if declared.kind != value.kind() {
            return Err(RegistryError::KindMismatch {
                operator: operator.to_string(),
                metric: metric.to_string(),
                expected: declared.kind,
                actual: value.kind(),
            });
        }
        Ok(())
    }

    /// Primary metric of each named operator, as dotted names
    pub fn default_metrics(&self, operators: &[String]) -> Result<Vec<String>, RegistryError> {
        let mut out = Vec::new();
        for name in operators {
            let spec = self.operator(name)?;
            if let Some(metric) = spec.primary_metric() {
                out.push(format!("{}.{}", spec.name, metric.name));
            }
        }
        Ok(out)
    }

    /// Operators in name order
    pub fn operators(&self) -> impl Iterator<Item = &OperatorSpec> {
        self.operators.values()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
