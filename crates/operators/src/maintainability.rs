//! Maintainability index

use crate::cyclomatic::file_complexity;
use crate::source::Source;
use crate::{measure_sources, Operator, Targets};
use anyhow::Result;
use tm_core::{Aim, AnalysisConfig, FileMetrics, Metric, MetricMap, OperatorLevel, OperatorOutput, OperatorSpec};

/// Maintainability index (0-100) and its letter rank
pub struct Maintainability {
    spec: OperatorSpec,
}

impl Maintainability {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec {
                name: "maintainability".to_string(),
                description: "Maintainability index".to_string(),
                level: OperatorLevel::File,
                metrics: vec![
                    Metric::numeric("mi", "Maintainability Index", Aim::High),
                    Metric::text("rank", "Maintainability Ranking"),
                ],
            },
        }
    }
}

impl Default for Maintainability {
    fn default() -> Self {
        Self::new()
    }
}

/// `A` above 19, `B` above 9, `C` otherwise
pub fn rank(mi: f64) -> &'static str {
    if mi > 19.0 {
        "A"
    } else if mi > 9.0 {
        "B"
    } else {
        "C"
    }
}

/// Index from Halstead volume, complexity, source lines and comment percentage
///
/// Scaled to 0-100 and rounded to two decimals. A file without source lines
/// scores 100.
pub fn maintainability_index(volume: f64, complexity: usize, sloc: usize, comment_percent: f64) -> f64 {
    if sloc == 0 {
        return 100.0;
    }
    let volume_term = 5.2 * volume.max(1.0).ln();
    let complexity_term = 0.23 * complexity as f64;
    let sloc_term = 16.2 * (sloc as f64).ln();
    let comment_term = 50.0 * (2.46 * comment_percent.to_radians()).sqrt().sin();

    let raw = 171.0 - volume_term - complexity_term - sloc_term + comment_term;
    let scaled = (raw * 100.0 / 171.0).clamp(0.0, 100.0);
    (scaled * 100.0).round() / 100.0
}

fn measure(source: &Source) -> FileMetrics {
    let counts = source.line_counts();
    let comment_percent = if counts.sloc == 0 {
        0.0
    } else {
        (counts.comments + counts.multi) as f64 * 100.0 / counts.sloc as f64
    };
    let mi = maintainability_index(
        source.halstead_volume(),
        file_complexity(source),
        counts.sloc,
        comment_percent,
    );

    let mut total = MetricMap::new();
    total.insert("mi".into(), mi.into());
    total.insert("rank".into(), rank(mi).into());
    FileMetrics::with_total(total)
}

impl Operator for Maintainability {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn run(&self, targets: &Targets, _config: &AnalysisConfig) -> Result<OperatorOutput> {
        measure_sources(self, targets, measure)
    }
}
