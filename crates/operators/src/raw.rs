//! Raw line metrics

use crate::source::Source;
use crate::{measure_sources, Operator, Targets};
use anyhow::Result;
use tm_core::{Aim, AnalysisConfig, FileMetrics, Metric, MetricMap, OperatorLevel, OperatorOutput, OperatorSpec};

/// Line counts per file (`loc`, `sloc`, `comments`, `multi`, `blank`)
pub struct Raw {
    spec: OperatorSpec,
}

impl Raw {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec {
                name: "raw".to_string(),
                description: "Raw line counts".to_string(),
                level: OperatorLevel::File,
                metrics: vec![
                    Metric::numeric("loc", "Lines of Code", Aim::Informational),
                    Metric::numeric("sloc", "Source Lines of Code", Aim::Informational),
                    Metric::numeric("comments", "Comment Lines", Aim::Informational),
                    Metric::numeric("multi", "Multi-line Strings/Comments", Aim::Informational),
                    Metric::numeric("blank", "Blank Lines", Aim::Informational),
                ],
            },
        }
    }
}

impl Default for Raw {
    fn default() -> Self {
        Self::new()
    }
}

fn measure(source: &Source) -> FileMetrics {
    let counts = source.line_counts();
    let mut total = MetricMap::new();
    total.insert("loc".into(), counts.loc.into());
    total.insert("sloc".into(), counts.sloc.into());
    total.insert("comments".into(), counts.comments.into());
    total.insert("multi".into(), counts.multi.into());
    total.insert("blank".into(), counts.blank.into());
    FileMetrics::with_total(total)
}

impl Operator for Raw {
    fn spec(&self) -> &OperatorSpec {
        &self.spec
    }

    fn run(&self, targets: &Targets, _config: &AnalysisConfig) -> Result<OperatorOutput> {
        measure_sources(self, targets, measure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tm_core::MetricValue;

    #[test]
    fn test_raw_counts() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::write(temp_dir.path().join("app.py"), "# header\n\nx = 1\ny = 2\n")?;
        std::fs::write(temp_dir.path().join("notes.txt"), "not source\n")?;

        let targets = Targets::from_files(
            temp_dir.path(),
            vec![PathBuf::from("app.py"), PathBuf::from("notes.txt")],
        );
        let output = Raw::new().run(&targets, &AnalysisConfig::default())?;

        assert_eq!(output.len(), 1);
        let total = &output["app.py"].total;
        assert_eq!(total["loc"], MetricValue::Numeric(4.0));
        assert_eq!(total["sloc"], MetricValue::Numeric(2.0));
        assert_eq!(total["comments"], MetricValue::Numeric(1.0));
        assert_eq!(total["blank"], MetricValue::Numeric(1.0));
        assert_eq!(total["multi"], MetricValue::Numeric(0.0));
        Ok(())
    }

    #[test]
    fn test_unreadable_file_is_absent() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::write(temp_dir.path().join("good.py"), "x = 1\n")?;
        std::fs::write(temp_dir.path().join("latin1.py"), [0x78u8, 0x3d, 0xe9, 0x0a])?;

        let targets = Targets::from_files(
            temp_dir.path(),
            vec![PathBuf::from("gone.py"), PathBuf::from("good.py"), PathBuf::from("latin1.py")],
        );
        let output = Raw::new().run(&targets, &AnalysisConfig::default())?;

        assert_eq!(output.len(), 1);
        assert_eq!(output["good.py"].total["loc"], MetricValue::Numeric(1.0));
        Ok(())
    }
}
