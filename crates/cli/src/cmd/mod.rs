//! CLI command implementations

pub mod build;
pub mod clean;
pub mod diff;
pub mod graph;
pub mod index;
pub mod list_metrics;
pub mod rank;
pub mod report;
pub mod setup;

use crate::render::MetricColumn;
use anyhow::Result;
use tm_core::Registry;

/// Resolve dotted `operator.metric` names into table columns
pub fn metric_columns(registry: &Registry, names: &[String]) -> Result<Vec<MetricColumn>> {
    names
        .iter()
        .map(|name| {
            let (spec, metric) = registry.resolve_metric(name.trim())?;
            Ok(MetricColumn {
                operator: spec.name.clone(),
                level: spec.level,
                metric: metric.clone(),
            })
        })
        .collect()
}

/// Requested metric names, or the primary metric of each configured operator
pub fn requested_metrics(registry: &Registry, requested: Vec<String>, operators: &[String]) -> Result<Vec<String>> {
    if !requested.is_empty() {
        return Ok(requested);
    }
    let defaults = registry.default_metrics(operators)?;
    tracing::info!(metrics = ?defaults, "using default metrics");
    Ok(defaults)
}
