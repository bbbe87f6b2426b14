//! Compare the working tree with an indexed revision
//!
//! The selected operators run on the current files; each value is compared
//! with the same metric in the baseline entry.

use crate::cmd::{metric_columns, requested_metrics, setup};
use crate::render::{diff_json, Cell, DiffFormat, DiffRow, MetricColumn, Table, TableStyle};
use crate::{util, GlobalOpts};
use anyhow::{Context, Result};
use journal::RevisionEntry;
use operators::{builtin_registry, file_key, run_operators, select_operators, Targets};
use owo_colors::OwoColorize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tm_core::store::atomic_write;
use tm_core::{compare, OperatorLevel, RunResult};

/// Options of `tm diff`
#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub metrics: Option<Vec<String>>,
    /// Include unchanged files
    pub all: bool,
    /// Include function/class rows
    pub detail: bool,
    pub revision: Option<String>,
    pub format: DiffFormat,
    pub output: Option<PathBuf>,
}

pub async fn run(opts: &GlobalOpts, files: Vec<PathBuf>, options: DiffOptions) -> Result<()> {
    // 1. Open cache and find the baseline
    let config = util::load_config(opts)?;
    setup::ensure_cache(opts, &config).await?;
    let cache = util::Cache::open(&config)?;
    let index = cache.indexed(&config)?;
    let baseline = util::resolve_entry(&config, &cache, &index, options.revision.as_deref())?;

    // 2. Resolve metric columns and the operators they need
    let registry = builtin_registry()?;
    let names = requested_metrics(&registry, options.metrics.clone().unwrap_or_default(), &config.operators)?;
    let columns = metric_columns(&registry, &names)?;
    let mut operator_names: Vec<String> = Vec::new();
    for column in &columns {
        if !operator_names.contains(&column.operator) {
            operator_names.push(column.operator.clone());
        }
    }

    // 3. Discover the requested files in the working tree
    let prefixes = files
        .iter()
        .map(|f| util::normalize_target(&config.path, f))
        .collect::<Result<Vec<_>>>()?;
    let targets = Targets::discover(&config.path, &prefixes, &config.analysis)?;
    if targets.is_empty() {
        anyhow::bail!("no files matched {:?}", files);
    }

    // 4. Run the operators on the working tree
    let analysis = config.analysis.clone();
    let run_targets = targets.clone();
    let current = tokio::task::spawn_blocking(move || -> Result<RunResult> {
        let operators = select_operators(&operator_names)?;
        Ok(run_operators(&operators, &run_targets, &analysis, &registry))
    })
    .await
    .context("Diff task failed")??;

    for (operator, reason) in current.unavailable() {
        eprintln!(
            "{}",
            format!("Warning: operator '{}' unavailable: {}", operator, reason).yellow()
        );
    }

    // 5. Compare
    let keys: Vec<String> = targets.files.iter().map(|f| file_key(f)).collect();
    let rows = diff_rows(&keys, &current, &baseline, &columns, options.detail, options.all);

    // 6. Render
    match options.format {
        DiffFormat::Json => {
            let json = serde_json::to_string_pretty(&diff_json(&rows, &columns))?;
            match &options.output {
                Some(path) => {
                    let target = util::resolve_output(&config.path, path);
                    atomic_write(&target, json.as_bytes())?;
                    println!("Diff saved to {}", target.display().to_string().cyan());
                }
                None => println!("{}", json),
            }
        }
        DiffFormat::Console => {
            let revision = &baseline.revision;
            println!(
                "Comparing working tree with {} by {} on {}",
                revision.short_key().yellow(),
                revision.author_name,
                util::format_date(revision.timestamp)
            );
            println!();

            if rows.is_empty() {
                println!("{}", "No metric changes found".green());
                println!("{}", "Tip: Use --all to show unchanged files".dimmed());
                return Ok(());
            }

            let mut headers = vec!["File".to_string()];
            headers.extend(columns.iter().map(|c| c.metric.description.clone()));
            let mut table = Table::new(headers);
            for row in &rows {
                let mut cells = vec![Cell::plain(row.location())];
                cells.extend(row.deltas.iter().map(Cell::comparison));
                table.rows.push(cells);
            }
            print!("{}", table.to_console(TableStyle::Plain));
        }
    }

    Ok(())
}

/// Compare every file (and, with `detail`, every function/class) in `files`
///
/// Files without data on either side are dropped. Unless `all` is set, rows
/// where nothing changed are dropped too.
pub fn diff_rows(
    files: &[String],
    current: &RunResult,
    baseline: &RevisionEntry,
    columns: &[MetricColumn],
    detail: bool,
    all: bool,
) -> Vec<DiffRow> {
    let mut rows = Vec::new();

    for file in files {
        let deltas = columns
            .iter()
            .map(|c| {
                compare(
                    current.metric(&c.operator, file, None, &c.metric.name).ok(),
                    baseline.get(&c.operator, file, None, &c.metric.name).ok(),
                    &c.metric,
                )
            })
            .collect::<Vec<_>>();
        if deltas.iter().all(|d| d.current.is_none() && d.baseline.is_none()) {
            continue;
        }
        let row = DiffRow {
            file: file.clone(),
            object: None,
            deltas,
        };
        if all || row.has_changes() {
            rows.push(row);
        }

        if !detail {
            continue;
        }
        for object in object_names(file, current, baseline, columns) {
            let deltas = columns
                .iter()
                .map(|c| {
                    let (now, before) = match c.level {
                        OperatorLevel::Object => (
                            current.metric(&c.operator, file, Some(&object), &c.metric.name).ok(),
                            baseline.get(&c.operator, file, Some(&object), &c.metric.name).ok(),
                        ),
                        OperatorLevel::File => (None, None),
                    };
                    compare(now, before, &c.metric)
                })
                .collect();
            let row = DiffRow {
                file: file.clone(),
                object: Some(object),
                deltas,
            };
            if all || row.has_changes() {
                rows.push(row);
            }
        }
    }

    rows
}

/// Function/class names on either side for the object-level columns
fn object_names(file: &str, current: &RunResult, baseline: &RevisionEntry, columns: &[MetricColumn]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for column in columns.iter().filter(|c| c.level == OperatorLevel::Object) {
        let sides = [
            current.output(&column.operator),
            baseline.operators.get(&column.operator),
        ];
        for output in sides.into_iter().flatten() {
            if let Some(metrics) = output.get(file) {
                names.extend(metrics.detailed.keys().cloned());
            }
        }
    }
    names
}
