//! Show the history of metrics for one file
//!
//! Rows are newest first; every numeric cell carries its delta against the
//! most recent older revision that had a value, styled by the delta engine.

use crate::cmd::{metric_columns, requested_metrics, setup};
use crate::render::{Cell, MetricColumn, ReportFormat, Table, TableStyle};
use crate::{util, GlobalOpts};
use anyhow::Result;
use journal::RevisionEntry;
use operators::{builtin_registry, file_key};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tm_core::store::atomic_write;
use tm_core::{compare, MetricValue};

/// Default output directory for HTML reports
const DEFAULT_REPORT_DIR: &str = "tidemark_report";

const MESSAGE_WIDTH: usize = 50;

/// Options of `tm report`
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub metrics: Vec<String>,
    /// Newest revisions to show; all when absent
    pub number: Option<usize>,
    pub include_message: bool,
    pub format: ReportFormat,
    pub console_format: TableStyle,
    pub output: Option<PathBuf>,
}

pub async fn run(opts: &GlobalOpts, file: &str, options: ReportOptions) -> Result<()> {
    // 1. Open cache
    let config = util::load_config(opts)?;
    setup::ensure_cache(opts, &config).await?;
    let cache = util::Cache::open(&config)?;
    let index = cache.indexed(&config)?;

    // 2. Resolve metric columns
    let registry = builtin_registry()?;
    let names = requested_metrics(&registry, options.metrics, &config.operators)?;
    let columns = metric_columns(&registry, &names)?;

    // 3. Read history, newest first
    let path = file_key(&util::normalize_target(&config.path, Path::new(file))?);
    let entries = index.history(options.number.unwrap_or(usize::MAX))?;
    tracing::debug!(file = %path, revisions = entries.len(), "building report");

    let table = report_table(&entries, &path, &columns, options.include_message);
    let has_data = entries
        .iter()
        .any(|e| columns.iter().any(|c| e.get(&c.operator, &path, None, &c.metric.name).is_ok()));

    // 4. Render
    match options.format {
        ReportFormat::Console => {
            println!("{} {}", "History for".bold(), path.cyan());
            println!();
            print!("{}", table.to_console(options.console_format));
            if !has_data {
                println!();
                println!(
                    "{}",
                    format!("Tip: No indexed data for {}; check the path is relative to the project root", path)
                        .dimmed()
                );
            }
        }
        ReportFormat::Html => {
            let target = util::html_output_path(&config.path, options.output.as_deref(), DEFAULT_REPORT_DIR);
            let html = table.to_html(&format!("tidemark report: {}", path));
            atomic_write(&target, html.as_bytes())?;
            println!("Report saved to {}", target.display().to_string().cyan());
        }
    }

    Ok(())
}

/// Build the report table for `file` from `entries` (newest first)
pub fn report_table(
    entries: &[RevisionEntry],
    file: &str,
    columns: &[MetricColumn],
    include_message: bool,
) -> Table {
    let mut headers = vec!["Revision".to_string()];
    if include_message {
        headers.push("Message".to_string());
    }
    headers.push("Author".to_string());
    headers.push("Date".to_string());
    headers.extend(columns.iter().map(|c| c.metric.description.clone()));

    let value = |entry: &RevisionEntry, column: &MetricColumn| -> Option<MetricValue> {
        entry
            .get(&column.operator, file, None, &column.metric.name)
            .ok()
            .cloned()
    };

    // Oldest first so each column can carry its last seen value forward
    let mut last_seen: Vec<Option<MetricValue>> = vec![None; columns.len()];
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries.iter().rev() {
        let revision = &entry.revision;
        let mut row = vec![Cell::plain(revision.short_key())];
        if include_message {
            row.push(Cell::plain(revision.summary(MESSAGE_WIDTH)));
        }
        row.push(Cell::plain(revision.author_name.clone()));
        row.push(Cell::plain(util::format_date(revision.timestamp)));

        for (column, previous) in columns.iter().zip(last_seen.iter_mut()) {
            let current = value(entry, column);
            let delta = compare(current.as_ref(), previous.as_ref(), &column.metric);
            row.push(Cell::history(&delta));
            if current.is_some() {
                *previous = current;
            }
        }
        rows.push(row);
    }
    rows.reverse();

    let mut table = Table::new(headers);
    table.rows = rows;
    table
}
