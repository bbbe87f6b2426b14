//! Delta engine: typed comparison of two metric snapshots
//!
//! Classification happens once, here. Console, HTML and JSON renderers only
//! map the resulting [`Style`] to their own representation.

use crate::metric::{format_number, Aim, Metric, MetricValue};
use serde::Serialize;

/// Rendered in place of an absent value
pub const PLACEHOLDER: &str = "-";

/// How the current value moved relative to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Moved in the direction the metric's aim favours
    Improvement,
    /// Moved against the metric's aim
    Regression,
    /// Same value on both sides
    Unchanged,
    /// Textual value differs
    Changed,
    /// No classification (a side is absent, or the metric is informational)
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Improvement => "improvement",
            Direction::Regression => "regression",
            Direction::Unchanged => "unchanged",
            Direction::Changed => "changed",
            Direction::Neutral => "neutral",
        }
    }
}

/// Presentation class shared by every renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Good,
    Bad,
    Info,
    Plain,
}

/// Comparison of one metric between a current and a baseline snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaResult {
    pub current: Option<MetricValue>,
    pub baseline: Option<MetricValue>,
    pub current_display: String,
    pub baseline_display: String,
    /// `current - baseline`, numeric pairs only
    pub delta: Option<f64>,
    pub direction: Direction,
    pub style: Style,
}

impl DeltaResult {
    /// True when presence or value differs between the two sides
    pub fn is_change(&self) -> bool {
        self.current != self.baseline
    }

    /// `+3`, `-2.50`, `0`; `None` when no arithmetic delta exists
    pub fn signed_delta(&self) -> Option<String> {
        self.delta.map(|d| {
            if d > 0.0 {
                format!("+{}", format_number(d))
            } else {
                format_number(d)
            }
        })
    }
}

fn display(value: Option<&MetricValue>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string())
}

/// Compare `current` against `baseline` for `metric`
pub fn compare(
    current: Option<&MetricValue>,
    baseline: Option<&MetricValue>,
    metric: &Metric,
) -> DeltaResult {
    let (delta, direction, style) = match (current, baseline) {
        (Some(MetricValue::Numeric(now)), Some(MetricValue::Numeric(before))) => {
            let delta = now - before;
            let (direction, style) = classify_numeric(delta, metric.aim);
            (Some(delta), direction, style)
        }
        (Some(MetricValue::Text(now)), Some(MetricValue::Text(before))) => {
            if now == before {
                (None, Direction::Unchanged, Style::Plain)
            } else {
                (None, Direction::Changed, Style::Info)
            }
        }
        (Some(_), Some(_)) => {
            tracing::warn!(
                metric = %metric.name,
                "metric has values of different kinds, comparing by equality"
            );
            (None, Direction::Changed, Style::Plain)
        }
        _ => (None, Direction::Neutral, Style::Plain),
    };

    DeltaResult {
        current: current.cloned(),
        baseline: baseline.cloned(),
        current_display: display(current),
        baseline_display: display(baseline),
        delta,
        direction,
        style,
    }
}

fn classify_numeric(delta: f64, aim: Aim) -> (Direction, Style) {
    if delta == 0.0 {
        return (Direction::Unchanged, Style::Plain);
    }
    let improved = match aim {
        Aim::High => delta > 0.0,
        Aim::Low => delta < 0.0,
        Aim::Informational => return (Direction::Neutral, Style::Info),
    };
    if improved {
        (Direction::Improvement, Style::Good)
    } else {
        (Direction::Regression, Style::Bad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> MetricValue {
        MetricValue::Numeric(v)
    }

    #[test]
    fn test_aim_high_increase_is_improvement() {
        let metric = Metric::numeric("mi", "Maintainability Index", Aim::High);
        let result = compare(Some(&num(10.0)), Some(&num(7.0)), &metric);
        assert_eq!(result.direction, Direction::Improvement);
        assert_eq!(result.style, Style::Good);
        assert_eq!(result.delta, Some(3.0));
        assert_eq!(result.signed_delta().as_deref(), Some("+3"));
    }

    #[test]
    fn test_aim_low_increase_is_regression() {
        let metric = Metric::numeric("complexity", "Cyclomatic Complexity", Aim::Low);
        let result = compare(Some(&num(10.0)), Some(&num(7.0)), &metric);
        assert_eq!(result.direction, Direction::Regression);
        assert_eq!(result.style, Style::Bad);
    }

    #[test]
    fn test_aim_low_decrease_is_improvement() {
        let metric = Metric::numeric("complexity", "Cyclomatic Complexity", Aim::Low);
        let result = compare(Some(&num(7.0)), Some(&num(10.0)), &metric);
        assert_eq!(result.direction, Direction::Improvement);
        assert_eq!(result.signed_delta().as_deref(), Some("-3"));
    }

    #[test]
    fn test_equal_values_unchanged_regardless_of_aim() {
        for aim in [Aim::High, Aim::Low, Aim::Informational] {
            let metric = Metric::numeric("m", "M", aim);
            let result = compare(Some(&num(5.0)), Some(&num(5.0)), &metric);
            assert_eq!(result.direction, Direction::Unchanged);
            assert!(!result.is_change());
        }
    }

    #[test]
    fn test_informational_never_classified() {
        let metric = Metric::numeric("loc", "Lines of Code", Aim::Informational);
        let up = compare(Some(&num(120.0)), Some(&num(100.0)), &metric);
        let down = compare(Some(&num(80.0)), Some(&num(100.0)), &metric);
        assert_eq!(up.direction, Direction::Neutral);
        assert_eq!(down.direction, Direction::Neutral);
        assert_eq!(up.style, Style::Info);
    }

    #[test]
    fn test_absent_baseline() {
        let metric = Metric::numeric("complexity", "Cyclomatic Complexity", Aim::Low);
        let result = compare(Some(&num(42.0)), None, &metric);
        assert_eq!(result.baseline_display, PLACEHOLDER);
        assert_eq!(result.current_display, "42");
        assert_eq!(result.direction, Direction::Neutral);
        assert_eq!(result.delta, None);
        assert!(result.is_change());
    }

    #[test]
    fn test_both_absent() {
        let metric = Metric::numeric("complexity", "Cyclomatic Complexity", Aim::Low);
        let result = compare(None, None, &metric);
        assert_eq!(result.current_display, PLACEHOLDER);
        assert_eq!(result.baseline_display, PLACEHOLDER);
        assert!(!result.is_change());
    }

    #[test]
    fn test_text_equality_only() {
        let metric = Metric::text("rank", "Maintainability Rank");
        let same = compare(Some(&"A".into()), Some(&"A".into()), &metric);
        let changed = compare(Some(&"B".into()), Some(&"A".into()), &metric);
        assert_eq!(same.direction, Direction::Unchanged);
        assert_eq!(changed.direction, Direction::Changed);
        assert_eq!(changed.delta, None);
        assert_eq!(changed.signed_delta(), None);
    }
}
