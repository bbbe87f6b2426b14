//! Tidemark CLI - tm command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tidemark_cli::cmd;
use tidemark_cli::render::{DiffFormat, ReportFormat, TableStyle};
use tidemark_cli::{logging, util, GlobalOpts};

/// Tidemark - code quality metrics across your project's history
#[derive(Parser)]
#[command(name = "tm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print debug information
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: tidemark.toml in the project root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project root (default: current directory)
    #[arg(short = 'p', long, global = true)]
    path: Option<PathBuf>,

    /// Cache directory (default: .tidemark in the project root)
    #[arg(short = 'c', long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index revisions that are not in the cache yet
    Build {
        /// Paths to analyse (default: configured targets, else everything)
        targets: Vec<PathBuf>,

        /// Maximum number of historical revisions to index
        #[arg(short = 'n', long)]
        max_revisions: Option<usize>,

        /// Operators to run, separated by commas
        #[arg(short = 'o', long, value_delimiter = ',')]
        operators: Option<Vec<String>>,

        /// Archiver to use (git or filesystem)
        #[arg(short = 'a', long)]
        archiver: Option<String>,
    },
    /// Show the indexed revisions
    Index {
        /// Include revision messages
        #[arg(short = 'm', long)]
        message: bool,
    },
    /// Show the history of metrics for one file
    Report {
        /// File to report on, relative to the project root
        file: String,

        /// Metrics as operator.metric (default: primary metric of each operator)
        metrics: Vec<String>,

        /// Number of revisions to show
        #[arg(short = 'n', long)]
        number: Option<usize>,

        /// Include revision messages
        #[arg(short = 'm', long)]
        message: bool,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "console")]
        format: ReportFormat,

        /// Table layout for console output
        #[arg(long, value_enum, default_value = "plain")]
        console_format: TableStyle,

        /// Output path for HTML reports (default: tidemark_report/index.html)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Compare the working tree with an indexed revision
    Diff {
        /// Files or directories to compare
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Metrics as operator.metric, separated by commas
        #[arg(short = 'm', long, value_delimiter = ',')]
        metrics: Option<Vec<String>>,

        /// Show every file instead of changed files only
        #[arg(long)]
        all: bool,

        /// Hide function/class level rows
        #[arg(long)]
        no_detail: bool,

        /// Compare against this revision (default: last indexed)
        #[arg(short = 'r', long)]
        revision: Option<String>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "console")]
        format: DiffFormat,

        /// Output path for JSON output (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Rank files, functions and classes by a metric
    Rank {
        /// Only rank files under this path
        #[arg(id = "rank_path", value_name = "PATH")]
        path: Option<String>,

        /// Metric to rank by
        #[arg(default_value = "maintainability.mi")]
        metric: String,

        /// Rank at this revision (default: last indexed)
        #[arg(short = 'r', long)]
        revision: Option<String>,

        /// Number of rows to show
        #[arg(short = 'l', long)]
        limit: Option<usize>,

        /// Highest values first
        #[arg(long)]
        desc: bool,

        /// Exit non-zero when the total is below this value
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Plot metrics over history as an HTML chart
    Graph {
        /// File or directory to graph, relative to the project root
        #[arg(id = "graph_path", value_name = "PATH")]
        path: String,

        /// Metrics as operator.metric
        #[arg(required = true)]
        metrics: Vec<String>,

        /// Metric for the x axis (default: revision date)
        #[arg(short = 'x', long)]
        x_axis: Option<String>,

        /// Plot every revision instead of changes only
        #[arg(long)]
        all: bool,

        /// Output path (default: tidemark_graph/index.html)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// List the available metrics
    ListMetrics,
    /// Delete the cache directory
    Clean {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let opts = GlobalOpts {
        debug: cli.debug,
        config: cli.config,
        path: cli.path,
        cache: cli.cache,
    };

    // Keep the guard alive so buffered log lines reach the file
    let _log_guard = logging::init(opts.debug, util::existing_cache_dir(&opts).as_deref())?;

    match cli.command {
        Commands::Build { targets, max_revisions, operators, archiver } => {
            cmd::build::run(&opts, targets, max_revisions, operators, archiver).await
        }
        Commands::Index { message } => cmd::index::run(&opts, message).await,
        Commands::Report { file, metrics, number, message, format, console_format, output } => {
            let options = cmd::report::ReportOptions {
                metrics,
                number,
                include_message: message,
                format,
                console_format,
                output,
            };
            cmd::report::run(&opts, &file, options).await
        }
        Commands::Diff { files, metrics, all, no_detail, revision, format, output } => {
            let options = cmd::diff::DiffOptions {
                metrics,
                all,
                detail: !no_detail,
                revision,
                format,
                output,
            };
            cmd::diff::run(&opts, files, options).await
        }
        Commands::Rank { path, metric, revision, limit, desc, threshold } => {
            let options = cmd::rank::RankOptions {
                path,
                metric,
                revision,
                limit,
                descending: desc,
                threshold,
            };
            cmd::rank::run(&opts, options).await
        }
        Commands::Graph { path, metrics, x_axis, all, output } => {
            let options = cmd::graph::GraphOptions { metrics, x_axis, all, output };
            cmd::graph::run(&opts, &path, options).await
        }
        Commands::ListMetrics => cmd::list_metrics::run().await,
        Commands::Clean { yes } => cmd::clean::run(&opts, yes).await,
    }
}
