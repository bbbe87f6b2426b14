//! Metric declarations and typed metric values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which direction of change counts as an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aim {
    /// Higher values are better (e.g. maintainability index)
    High,
    /// Lower values are better (e.g. cyclomatic complexity)
    Low,
    /// Neither direction is good or bad (e.g. lines of code)
    Informational,
}

/// Value type a metric is declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    Numeric,
    Text,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Numeric => write!(f, "numeric"),
            MetricKind::Text => write!(f, "text"),
        }
    }
}

/// A named, typed measurement produced by an operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Unique within its operator
    pub name: String,
    /// Human readable column title
    pub description: String,
    pub kind: MetricKind,
    pub aim: Aim,
}

impl Metric {
    pub fn numeric(name: &str, description: &str, aim: Aim) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: MetricKind::Numeric,
            aim,
        }
    }

    /// Textual metrics are compared by equality only, so they are always informational
    pub fn text(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: MetricKind::Text,
            aim: Aim::Informational,
        }
    }
}

/// A stored metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    Numeric(f64),
    Text(String),
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Numeric(_) => MetricKind::Numeric,
            MetricValue::Text(_) => MetricKind::Text,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Numeric(n) => Some(*n),
            MetricValue::Text(_) => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Numeric(value)
    }
}

impl From<usize> for MetricValue {
    fn from(value: usize) -> Self {
        MetricValue::Numeric(value as f64)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        MetricValue::Text(value)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Numeric(n) => write!(f, "{}", format_number(*n)),
            MetricValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Integral values print without decimals, everything else with two
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
