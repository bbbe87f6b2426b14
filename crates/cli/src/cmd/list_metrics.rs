//! List the operators and metrics in the registry

use anyhow::Result;
use operators::builtin_registry;
use owo_colors::OwoColorize;
use tm_core::{Aim, OperatorLevel};

pub async fn run() -> Result<()> {
    let registry = builtin_registry()?;

    println!("{}", "Available Metrics".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for spec in registry.operators() {
        let level = match spec.level {
            OperatorLevel::File => "file",
            OperatorLevel::Object => "file + function/class",
        };
        println!();
        println!("{} {}", spec.name.cyan().bold(), format!("({}; {})", spec.description, level).dimmed());

        for metric in &spec.metrics {
            let aim = match metric.aim {
                Aim::High => "higher is better".green().to_string(),
                Aim::Low => "lower is better".green().to_string(),
                Aim::Informational => "informational".yellow().to_string(),
            };
            println!(
                "  {:<28} {:<32} {:<8} {}",
                format!("{}.{}", spec.name, metric.name),
                metric.description,
                metric.kind.to_string(),
                aim
            );
        }
    }

    println!();
    println!("{}", "Tip: Pass metrics as operator.metric, e.g. 'tm report app.py raw.loc'".dimmed());
    Ok(())
}
