//! Bring the revision index up to date with the archiver's history

use crate::locks::BuildLock;
use crate::{util, GlobalOpts};
use anyhow::{Context, Result};
use archiver::resolve_archiver;
use indicatif::{ProgressBar, ProgressStyle};
use journal::{BuildProgress, BuildReport, Builder, Index};
use operators::{builtin_registry, run_operators, select_operators, Targets};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tm_core::{Config, Store};

pub async fn run(
    opts: &GlobalOpts,
    targets: Vec<PathBuf>,
    max_revisions: Option<usize>,
    operators: Option<Vec<String>>,
    archiver: Option<String>,
) -> Result<()> {
    // 1. Load configuration and apply overrides
    let mut config = util::load_config(opts)?;
    if !targets.is_empty() {
        config.targets = targets
            .iter()
            .map(|t| util::normalize_target(&config.path, t))
            .collect::<Result<_>>()?;
    }
    if let Some(max) = max_revisions {
        config.max_revisions = max;
    }
    if let Some(operators) = operators {
        config.operators = operators.into_iter().map(|o| o.trim().to_string()).collect();
    }
    if let Some(archiver) = archiver {
        config.archiver = archiver;
    }
    config.validate().context("Invalid build options")?;
    select_operators(&config.operators)?;

    // 2. Create the cache and take the build lock
    let store = Store::init(&config.cache_dir())?;
    let _lock = BuildLock::acquire(store.root())?;

    println!(
        "{} {} with {} ({})",
        "Building".bold(),
        config.path.display().to_string().cyan(),
        config.archiver,
        config.operators.join(", ")
    );

    // 3. Analyse missing revisions off the async runtime
    let task_config = config.clone();
    let task_store = store.clone();
    let (report, total) = tokio::task::spawn_blocking(move || build(&task_config, &task_store))
        .await
        .context("Build task failed")??;

    // 4. Summary
    println!();
    println!("{}", "Build Complete".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Indexed:          {}", report.indexed.len().to_string().green());
    println!("Already indexed:  {}", report.already_indexed);
    if !report.failed.is_empty() {
        println!("Failed:           {}", report.failed.len().to_string().red());
        for (key, reason) in &report.failed {
            let short: String = key.chars().take(7).collect();
            println!("  {} {}", short.yellow(), reason.dimmed());
        }
    }
    println!("Revisions total:  {}", total);
    println!();
    println!(
        "{}",
        "Tip: Run 'tm report <file>' or 'tm index' to see the history".dimmed()
    );

    Ok(())
}

/// Plan and run the build; returns the report and the index size afterwards
fn build(config: &Config, store: &Store) -> Result<(BuildReport, usize)> {
    let registry = builtin_registry()?;
    let operators = select_operators(&config.operators)?;
    let archiver = resolve_archiver(&config.archiver, config, &store.checkout_dir())?;

    let index = Index::open(&store.index_dir()).context("Failed to open revision index")?;
    let archiver_index = index.archiver(archiver.name())?;

    let upstream = archiver
        .list_revisions()
        .context("Failed to list revisions")?;
    let plan = journal::plan(upstream, &archiver_index);
    if plan.is_empty() {
        let report = BuildReport {
            already_indexed: plan.already_indexed,
            ..BuildReport::default()
        };
        return Ok((report, archiver_index.len()));
    }

    let bar = ProgressBar::new(plan.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let report = Builder::new(&archiver_index).run(
        plan,
        |revision| {
            let root = archiver.materialize(revision)?;
            let targets = Targets::discover(&root, &config.targets, &config.analysis)?;
            Ok(run_operators(&operators, &targets, &config.analysis, &registry))
        },
        |event| match event {
            BuildProgress::Started { revision, .. } => {
                bar.set_message(format!("{} {}", revision.short_key(), revision.summary(40)));
            }
            BuildProgress::Indexed { unavailable, .. } => {
                if unavailable > 0 {
                    bar.println(format!("{} operator(s) unavailable", unavailable));
                }
                bar.inc(1);
            }
            BuildProgress::Failed { revision, reason } => {
                bar.println(format!("skipped {}: {}", revision.short_key(), reason));
                bar.inc(1);
            }
        },
    )?;
    bar.finish_and_clear();

    index.flush()?;
    Ok((report, archiver_index.len()))
}
