//! Plot metrics over history as an HTML line chart

use crate::cmd::{metric_columns, setup};
use crate::render::{Chart, MetricColumn, Point, Series};
use crate::{util, GlobalOpts};
use anyhow::Result;
use journal::RevisionEntry;
use operators::{builtin_registry, file_key};
use owo_colors::OwoColorize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tm_core::metric::format_number;
use tm_core::store::atomic_write;
use tm_core::MetricKind;

/// Default output directory for graphs
const DEFAULT_GRAPH_DIR: &str = "tidemark_graph";

/// Options of `tm graph`
#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub metrics: Vec<String>,
    /// Metric for the x axis; revision date when absent
    pub x_axis: Option<String>,
    /// Plot every revision instead of changes only
    pub all: bool,
    pub output: Option<PathBuf>,
}

pub async fn run(opts: &GlobalOpts, path: &str, options: GraphOptions) -> Result<()> {
    // 1. Open cache
    let config = util::load_config(opts)?;
    setup::ensure_cache(opts, &config).await?;
    let cache = util::Cache::open(&config)?;
    let index = cache.indexed(&config)?;

    // 2. Resolve metrics; only numeric ones can be plotted
    let registry = builtin_registry()?;
    let columns = metric_columns(&registry, &options.metrics)?;
    let x_column = match &options.x_axis {
        Some(name) => metric_columns(&registry, &[name.clone()])?.pop(),
        None => None,
    };
    for column in columns.iter().chain(x_column.iter()) {
        if column.metric.kind != MetricKind::Numeric {
            anyhow::bail!(
                "{}.{} is a text metric and cannot be graphed",
                column.operator,
                column.metric.name
            );
        }
    }

    // 3. Collect series, oldest first
    let prefix = file_key(&util::normalize_target(&config.path, Path::new(path))?);
    let mut entries = index.history(usize::MAX)?;
    entries.reverse();
    let series = graph_series(&entries, &columns, x_column.as_ref(), &prefix, !options.all);
    tracing::debug!(path = %prefix, series = series.len(), "building graph");
    if series.is_empty() {
        anyhow::bail!("no indexed data for {}; check the path is relative to the project root", prefix);
    }

    // 4. Write the chart
    let y_label = columns
        .iter()
        .map(|c| c.metric.description.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let chart = Chart {
        title: format!("tidemark graph: {}", prefix),
        x_label: x_column
            .as_ref()
            .map_or_else(|| "Date".to_string(), |c| c.metric.description.clone()),
        y_label,
        x_is_time: x_column.is_none(),
        series,
    };
    let target = util::html_output_path(&config.path, options.output.as_deref(), DEFAULT_GRAPH_DIR);
    atomic_write(&target, chart.to_html().as_bytes())?;
    println!("Graph saved to {}", target.display().to_string().cyan());

    Ok(())
}

/// One series per file under `prefix`, or per file and metric when several
/// metrics are plotted. `entries` are oldest first. With `changes_only`, a
/// point equal to the previous one in its series is skipped.
pub fn graph_series(
    entries: &[RevisionEntry],
    columns: &[MetricColumn],
    x_axis: Option<&MetricColumn>,
    prefix: &str,
    changes_only: bool,
) -> Vec<Series> {
    let files: BTreeSet<&str> = entries
        .iter()
        .flat_map(|entry| columns.iter().flat_map(move |c| entry.files(&c.operator)))
        .filter(|file| util::is_under(file, prefix))
        .collect();

    let number = |entry: &RevisionEntry, column: &MetricColumn, file: &str| {
        entry
            .get(&column.operator, file, None, &column.metric.name)
            .ok()
            .and_then(|v| v.as_number())
    };

    let mut series = Vec::new();
    for file in files {
        for column in columns {
            let mut points: Vec<Point> = Vec::new();
            for entry in entries {
                let Some(y) = number(entry, column, file) else {
                    continue;
                };
                let x = match x_axis {
                    Some(x_column) => match number(entry, x_column, file) {
                        Some(x) => x,
                        None => continue,
                    },
                    None => entry.revision.timestamp as f64,
                };
                if changes_only {
                    if let Some(last) = points.last() {
                        if last.y == y && (x_axis.is_none() || last.x == x) {
                            continue;
                        }
                    }
                }
                points.push(Point {
                    x,
                    y,
                    label: format!(
                        "{} {}: {}",
                        entry.revision.short_key(),
                        entry.revision.author_name,
                        format_number(y)
                    ),
                });
            }
            if points.is_empty() {
                continue;
            }
            let name = if columns.len() > 1 {
                format!("{} {}", file, column.metric.description)
            } else {
                file.to_string()
            };
            series.push(Series { name, points });
        }
    }
    series
}
