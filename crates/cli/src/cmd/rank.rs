//! Rank files, functions and classes by one metric at one revision

use crate::cmd::setup;
use crate::render::{Cell, MetricColumn, Table, TableStyle};
use crate::{util, GlobalOpts};
use anyhow::Result;
use journal::RevisionEntry;
use operators::builtin_registry;
use owo_colors::OwoColorize;
use std::cmp::Ordering;
use std::path::Path;
use tm_core::metric::format_number;
use tm_core::{Aim, MetricValue, OperatorLevel};

/// Options of `tm rank`
#[derive(Debug, Clone)]
pub struct RankOptions {
    /// Only files under this path
    pub path: Option<String>,
    pub metric: String,
    pub revision: Option<String>,
    pub limit: Option<usize>,
    pub descending: bool,
    pub threshold: Option<f64>,
}

/// One ranked file or object
#[derive(Debug, Clone, PartialEq)]
pub struct RankRow {
    pub location: String,
    pub value: MetricValue,
    /// False for function/class rows
    pub is_file: bool,
}

pub async fn run(opts: &GlobalOpts, options: RankOptions) -> Result<()> {
    // 1. Open cache and pick the revision
    let config = util::load_config(opts)?;
    setup::ensure_cache(opts, &config).await?;
    let cache = util::Cache::open(&config)?;
    let index = cache.indexed(&config)?;
    let entry = util::resolve_entry(&config, &cache, &index, options.revision.as_deref())?;

    // 2. Resolve metric
    let registry = builtin_registry()?;
    let columns = crate::cmd::metric_columns(&registry, &[options.metric.clone()])?;
    let column = &columns[0];

    // 3. Collect and sort
    let prefix = match &options.path {
        Some(path) => Some(operators::file_key(&util::normalize_target(&config.path, Path::new(path))?)),
        None => None,
    };
    let mut rows = rank_rows(&entry, column, prefix.as_deref());
    sort_rows(&mut rows, options.descending);
    let total = file_total(&rows, column.metric.aim);
    if let Some(limit) = options.limit {
        rows.truncate(limit);
    }

    // 4. Display
    let revision = &entry.revision;
    println!(
        "{} by {} at {} ({})",
        "Rank".bold(),
        column.metric.description.cyan(),
        revision.short_key().yellow(),
        util::format_date(revision.timestamp)
    );
    println!();

    let mut table = Table::new(vec!["File".to_string(), column.metric.description.clone()]);
    for row in &rows {
        table
            .rows
            .push(vec![Cell::plain(row.location.clone()), Cell::plain(row.value.to_string())]);
    }
    if let Some(total) = total {
        table
            .rows
            .push(vec![Cell::plain("Total"), Cell::plain(format_number(total))]);
    }
    print!("{}", table.to_console(TableStyle::Plain));

    // 5. Threshold check
    if let Some(threshold) = options.threshold {
        match total {
            Some(total) if total < threshold => {
                anyhow::bail!(
                    "total {} for {} is below the threshold {}",
                    format_number(total),
                    options.metric,
                    format_number(threshold)
                );
            }
            Some(_) => {}
            None => anyhow::bail!("{} is not numeric; --threshold needs a numeric metric", options.metric),
        }
    }

    Ok(())
}

/// Every file (and function/class for object-level operators) with a value for `column`
pub fn rank_rows(entry: &RevisionEntry, column: &MetricColumn, prefix: Option<&str>) -> Vec<RankRow> {
    let mut rows = Vec::new();
    let Some(output) = entry.operators.get(&column.operator) else {
        return rows;
    };

    for (file, metrics) in output {
        if let Some(prefix) = prefix {
            if !util::is_under(file, prefix) {
                continue;
            }
        }
        if let Some(value) = metrics.total.get(&column.metric.name) {
            rows.push(RankRow {
                location: file.clone(),
                value: value.clone(),
                is_file: true,
            });
        }
        if column.level == OperatorLevel::Object {
            for (object, values) in &metrics.detailed {
                if let Some(value) = values.get(&column.metric.name) {
                    rows.push(RankRow {
                        location: format!("{}:{}", file, object),
                        value: value.clone(),
                        is_file: false,
                    });
                }
            }
        }
    }
    rows
}

/// Ascending by value, ties by location
pub fn sort_rows(rows: &mut [RankRow], descending: bool) {
    rows.sort_by(|a, b| {
        let by_value = match (&a.value, &b.value) {
            (MetricValue::Numeric(x), MetricValue::Numeric(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
            (x, y) => x.to_string().cmp(&y.to_string()),
        };
        let by_value = if descending { by_value.reverse() } else { by_value };
        by_value.then_with(|| a.location.cmp(&b.location))
    });
}

/// File-level total: mean for aim-high scores, sum otherwise; `None` for text metrics
pub fn file_total(rows: &[RankRow], aim: Aim) -> Option<f64> {
    let values: Vec<f64> = rows
        .iter()
        .filter(|r| r.is_file)
        .map(|r| r.value.as_number())
        .collect::<Option<Vec<f64>>>()?;
    let sum: f64 = values.iter().sum();
    match aim {
        Aim::High if !values.is_empty() => Some(sum / values.len() as f64),
        _ => Some(sum),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::metric_columns;
    use tm_core::{FileMetrics, MetricMap, OperatorOutcome, OperatorOutput, Revision, RunResult};

    fn entry() -> RevisionEntry {
        let mut cyclomatic = OperatorOutput::new();
        let mut mi = OperatorOutput::new();
        for (file, complexity, index) in [("src/a.py", 5.0, 60.0), ("src/b.py", 2.0, 80.0), ("tools/c.py", 9.0, 40.0)] {
            let mut total = MetricMap::new();
            total.insert("complexity".into(), MetricValue::Numeric(complexity));
            let mut metrics = FileMetrics::with_total(total);
            let mut detail = MetricMap::new();
            detail.insert("complexity".into(), MetricValue::Numeric(complexity - 1.0));
            metrics.detailed.insert("run".into(), detail);
            cyclomatic.insert(file.into(), metrics);

            let mut total = MetricMap::new();
            total.insert("mi".into(), MetricValue::Numeric(index));
            total.insert("rank".into(), MetricValue::Text("A".into()));
            mi.insert(file.into(), FileMetrics::with_total(total));
        }
        let mut run = RunResult::new();
        run.insert("cyclomatic", OperatorOutcome::Completed(cyclomatic));
        run.insert("maintainability", OperatorOutcome::Completed(mi));
        RevisionEntry::new(
            Revision {
                key: "k".into(),
                author_name: "Ada".into(),
                author_email: String::new(),
                message: String::new(),
                timestamp: 0,
                archiver: "git".into(),
            },
            run,
        )
    }

    fn column(name: &str) -> MetricColumn {
        let registry = builtin_registry().unwrap();
        metric_columns(&registry, &[name.to_string()]).unwrap().remove(0)
    }

    #[test]
    fn test_rank_objects_and_prefix() {
        let column = column("cyclomatic.complexity");
        let mut rows = rank_rows(&entry(), &column, Some("src"));
        sort_rows(&mut rows, true);

        let locations: Vec<&str> = rows.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, vec!["src/a.py", "src/a.py:run", "src/b.py", "src/b.py:run"]);
        assert_eq!(file_total(&rows, column.metric.aim), Some(7.0));
    }

    #[test]
    fn test_mean_total_for_aim_high() {
        let column = column("maintainability.mi");
        let mut rows = rank_rows(&entry(), &column, None);
        sort_rows(&mut rows, false);

        assert_eq!(rows[0].location, "tools/c.py");
        assert_eq!(file_total(&rows, column.metric.aim), Some(60.0));
    }

    #[test]
    fn test_text_metric_has_no_total() {
        let column = column("maintainability.rank");
        let rows = rank_rows(&entry(), &column, None);
        assert_eq!(rows.len(), 3);
        assert_eq!(file_total(&rows, column.metric.aim), None);
    }
}
