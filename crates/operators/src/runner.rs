//! Concurrent operator runner
//!
//! One scoped thread per operator. Each worker sends its outcome over a
//! bounded channel sized to the operator count, so sends never block; the end
//! of the scope is the join barrier. A failing or panicking operator is
//! reported as unavailable and never affects its siblings.

use crate::{Operator, Targets};
use crossbeam_channel::bounded;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tm_core::{AnalysisConfig, OperatorOutcome, OperatorOutput, Registry, RegistryError, RunResult};

/// Run every operator over `targets` and merge the outcomes
pub fn run_operators(
    operators: &[Box<dyn Operator>],
    targets: &Targets,
    config: &AnalysisConfig,
    registry: &Registry,
) -> RunResult {
    let (tx, rx) = bounded(operators.len().max(1));

    std::thread::scope(|scope| {
        for operator in operators {
            let tx = tx.clone();
            scope.spawn(move || {
                let name = operator.spec().name.clone();
                let span = tracing::debug_span!("operator", name = %name);
                let _enter = span.enter();

                let outcome = match catch_unwind(AssertUnwindSafe(|| operator.run(targets, config))) {
                    Ok(Ok(output)) => OperatorOutcome::Completed(output),
                    Ok(Err(e)) => OperatorOutcome::Unavailable {
                        reason: format!("{:#}", e),
                    },
                    Err(payload) => OperatorOutcome::Unavailable {
                        reason: format!("panicked: {}", panic_message(payload.as_ref())),
                    },
                };
                // Receiver outlives the scope
                let _ = tx.send((name, outcome));
            });
        }
    });
    drop(tx);

    let mut run = RunResult::new();
    for (name, outcome) in rx.iter() {
        let outcome = match outcome {
            OperatorOutcome::Completed(output) => match validate(registry, &name, &output) {
                Ok(()) => OperatorOutcome::Completed(output),
                Err(e) => OperatorOutcome::Unavailable {
                    reason: e.to_string(),
                },
            },
            unavailable => unavailable,
        };

        match &outcome {
            OperatorOutcome::Completed(output) => {
                tracing::debug!(operator = %name, files = output.len(), "operator completed");
            }
            OperatorOutcome::Unavailable { reason } => {
                tracing::warn!(operator = %name, reason = %reason, "operator unavailable for this run");
            }
        }
        run.insert(name, outcome);
    }
    run
}

/// Every value must belong to a declared metric of the declared kind
fn validate(registry: &Registry, operator: &str, output: &OperatorOutput) -> Result<(), RegistryError> {
    for file in output.values() {
        let values = file.total.iter().chain(file.detailed.values().flatten());
        for (metric, value) in values {
            registry.check_value(operator, metric, value)?;
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
