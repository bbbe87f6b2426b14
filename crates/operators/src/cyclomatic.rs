//! Cyclomatic complexity per file and per function

use crate::source::Source;
use crate::{measure_sources, Operator, Targets};
use anyhow::Result;
use std::collections::BTreeMap;
use tm_core::{Aim, AnalysisConfig, FileMetrics, Metric, MetricMap, OperatorLevel, OperatorOutput, OperatorSpec};

/// McCabe complexity: one plus the number of decision points
pub struct Cyclomatic {
    spec: OperatorSpec,
}

impl Cyclomatic {
    pub fn new() -> Self {
        Self {
            spec: OperatorSpec {
                name: "cyclomatic".to_string(),
                description: "Cyclomatic complexity of files and functions".to_string(),
                level: OperatorLevel::Object,
                metrics: vec![Metric::numeric("complexity", "Cyclomatic Complexity", Aim::Low)],
            },
        }
    }
}

impl Default for Cyclomatic {
    fn default() -> Self {
        Self::new()
    }
}

/// File complexity: sum over functions, or `1 + decisions` for a file without any
pub fn file_complexity(source: &Source) -> usize {
    let outline = source.outline();
    if outline.functions.is_empty() {
        1 + outline.decisions
    } else {
        outline.functions.iter().map(|f| 1 + f.decisions).sum()
    }
}

fn measure(source: &Source) -> FileMetrics {
    let outline = source.outline();
    let mut detailed: BTreeMap<String, MetricMap> = BTreeMap::new();
    let mut sum = 0;

    for function in &outline.functions {
        let complexity = 1 + function.decisions;
        sum += complexity;

        // Same qualified name twice (e.g. conditional definitions)
        let name = if detailed.contains_key(&function.name) {
            format!("{}@{}", function.name, function.line)
        } else {
            function.name.clone()
        };
        let mut values = MetricMap::new();
        values.insert("complexity".into(), complexity.into());
        detailed.insert(name, values);
    }

    let file_total = if outline.functions.is_empty() {
        1 + outline.decisions
    } else {
        sum
    };
    let mut total = MetricMap::new();
    total.insert("complexity".into(), file_total.into());
    FileMetrics { total, detailed }
}

impl Operator for Cyclomatic {
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
    use crate::source::Language;
    use tm_core::MetricValue;

    #[test]
    fn test_functions_are_summed() {
        let text = "def a(x):\n    if x:\n        return 1\n    return 0\n\ndef b(y):\n    return y\n";
        let metrics = measure(&Source::parse(Language::Python, text));
        assert_eq!(metrics.total["complexity"], MetricValue::Numeric(3.0));
        assert_eq!(metrics.detailed["a"]["complexity"], MetricValue::Numeric(2.0));
        assert_eq!(metrics.detailed["b"]["complexity"], MetricValue::Numeric(1.0));
    }

    #[test]
    fn test_module_without_functions() {
        let text = "x = 1\nif x:\n    print(x)\nwhile False:\n    pass\n";
        let source = Source::parse(Language::Python, text);
        let metrics = measure(&source);
        assert_eq!(metrics.total["complexity"], MetricValue::Numeric(3.0));
        assert!(metrics.detailed.is_empty());
        assert_eq!(file_complexity(&source), 3);
    }

    #[test]
    fn test_name_collision_gets_line_suffix() {
        let text = "if True:\n    def f():\n        pass\nelse:\n    def f():\n        pass\n";
        let metrics = measure(&Source::parse(Language::Python, text));
        let names: Vec<&String> = metrics.detailed.keys().collect();
        assert_eq!(names, vec!["f", "f@5"]);
    }

    #[test]
    fn test_rust_methods() {
        let text = "struct S;\nimpl S {\n    fn get(&self, v: Option<u8>) -> u8 {\n        match v {\n            Some(x) => x,\n            None => 0,\n        }\n    }\n}\n";
        let metrics = measure(&Source::parse(Language::Rust, text));
        assert_eq!(metrics.detailed["S::get"]["complexity"], MetricValue::Numeric(2.0));
    }
}
