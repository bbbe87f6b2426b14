//! Incremental build planning
//!
//! Works out which upstream revisions are missing from an [`ArchiverIndex`]
//! and indexes them one at a time, oldest first.

use crate::entry::RevisionEntry;
use crate::index::ArchiverIndex;
use crate::Result;
use tm_core::{Revision, RunResult};

/// Revisions that still need analysis, oldest first
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub missing: Vec<Revision>,
    /// Upstream revisions already present in the index
    pub already_indexed: usize,
}

impl BuildPlan {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn len(&self) -> usize {
        self.missing.len()
    }
}

/// Compute the set difference between `upstream` (oldest to newest) and `index`
pub fn plan(upstream: Vec<Revision>, index: &ArchiverIndex) -> BuildPlan {
    let total = upstream.len();
    let missing: Vec<Revision> = upstream
        .into_iter()
        .filter(|revision| !index.contains(&revision.key))
        .collect();

    tracing::debug!(
        archiver = %index.name(),
        upstream = total,
        missing = missing.len(),
        "planned build"
    );

    BuildPlan {
        already_indexed: total - missing.len(),
        missing,
    }
}

/// Progress events emitted while a plan runs
#[derive(Debug)]
pub enum BuildProgress<'a> {
    Started {
        revision: &'a Revision,
        position: usize,
        total: usize,
    },
    Indexed {
        revision: &'a Revision,
        unavailable: usize,
    },
    Failed {
        revision: &'a Revision,
        reason: String,
    },
}

/// Outcome of one build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Keys appended during this build, oldest first
    pub indexed: Vec<String>,
    /// Skipped revisions with the reason; retried on the next build
    pub failed: Vec<(String, String)>,
    pub already_indexed: usize,
}

/// Drives the sequential analyse-then-append loop for one archiver
pub struct Builder<'a> {
    index: &'a ArchiverIndex,
}

impl<'a> Builder<'a> {
    pub fn new(index: &'a ArchiverIndex) -> Self {
        Self { index }
    }

    /// Analyse and append every revision in `plan`
    ///
    /// A revision whose analysis errors, or for which no operator completed,
    /// is skipped and never appended. Index errors abort the build.
    pub fn run<A, P>(&self, plan: BuildPlan, mut analyze: A, mut progress: P) -> Result<BuildReport>
    where
        A: FnMut(&Revision) -> anyhow::Result<RunResult>,
        P: FnMut(BuildProgress<'_>),
    {
        let total = plan.missing.len();
        let mut report = BuildReport {
            already_indexed: plan.already_indexed,
            ..BuildReport::default()
        };

        for (i, revision) in plan.missing.into_iter().enumerate() {
            progress(BuildProgress::Started {
                revision: &revision,
                position: i + 1,
                total,
            });

            let run = match analyze(&revision) {
                Ok(run) if run.has_data() => run,
                Ok(run) => {
                    let reasons: Vec<String> = run
                        .unavailable()
                        .map(|(name, reason)| format!("{}: {}", name, reason))
                        .collect();
                    let reason = if reasons.is_empty() {
                        "no operators ran".to_string()
                    } else {
                        format!("every operator failed ({})", reasons.join("; "))
                    };
                    self.skip(&mut report, &revision, reason, &mut progress);
                    continue;
                }
                Err(e) => {
                    self.skip(&mut report, &revision, format!("{:#}", e), &mut progress);
                    continue;
                }
            };

            let entry = RevisionEntry::new(revision, run);
            // Duplicates here mean the plan went stale: propagate as an internal error
            self.index.append(&entry)?;

            progress(BuildProgress::Indexed {
                revision: &entry.revision,
                unavailable: entry.unavailable.len(),
            });
            report.indexed.push(entry.revision.key);
        }

        tracing::info!(
            archiver = %self.index.name(),
            indexed = report.indexed.len(),
            failed = report.failed.len(),
            "build finished"
        );
        Ok(report)
    }

    fn skip<P>(&self, report: &mut BuildReport, revision: &Revision, reason: String, progress: &mut P)
    where
        P: FnMut(BuildProgress<'_>),
    {
        tracing::warn!(revision = %revision.key, reason = %reason, "skipping revision");
        progress(BuildProgress::Failed {
            revision,
            reason: reason.clone(),
        });
        report.failed.push((revision.key.clone(), reason));
    }
}
