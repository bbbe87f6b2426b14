//! Console, HTML and JSON rendering of report and diff tables
//!
//! Cells carry the [`Style`] the delta engine picked; this module only maps a
//! style to a terminal colour, a CSS class or a JSON string.

use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde_json::{json, Map, Value};
use tm_core::metric::format_number;
use tm_core::{DeltaResult, Metric, MetricValue, OperatorLevel, Style, PLACEHOLDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Html,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiffFormat {
    Console,
    Json,
}

/// Console table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TableStyle {
    /// Aligned columns under a bold header
    #[default]
    Plain,
    /// Box-drawn borders around every cell
    Grid,
    /// Pipe table, uncoloured
    Markdown,
}

/// One metric column of a report or diff
#[derive(Debug, Clone)]
pub struct MetricColumn {
    pub operator: String,
    pub level: OperatorLevel,
    pub metric: Metric,
}

/// A run of text rendered in one style
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
}

/// A table cell made of styled segments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub segments: Vec<Segment>,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::default().push(text, Style::Plain)
    }

    fn push(mut self, text: impl Into<String>, style: Style) -> Self {
        self.segments.push(Segment {
            text: text.into(),
            style,
        });
        self
    }

    /// History cell: `value (delta)` against the next-older revision
    pub fn history(delta: &DeltaResult) -> Self {
        match (&delta.current, delta.signed_delta()) {
            (None, _) => Self::plain(PLACEHOLDER),
            (Some(MetricValue::Numeric(_)), Some(signed)) => Self::plain(format!("{} (", delta.current_display))
                .push(signed, delta.style)
                .push(")", Style::Plain),
            (Some(MetricValue::Numeric(_)), None) => Self::plain(delta.current_display.clone()),
            (Some(MetricValue::Text(_)), _) => Self::default().push(delta.current_display.clone(), delta.style),
        }
    }

    /// Diff cell: `baseline -> current`
    pub fn comparison(delta: &DeltaResult) -> Self {
        if delta.current.is_none() && delta.baseline.is_none() {
            return Self::plain(PLACEHOLDER);
        }
        Self::plain(format!("{} -> ", delta.baseline_display)).push(delta.current_display.clone(), delta.style)
    }

    /// Text without styling
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn width(&self) -> usize {
        self.segments.iter().map(|s| s.text.chars().count()).sum()
    }

    fn to_console(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s.style {
                Style::Good => s.text.green().to_string(),
                Style::Bad => s.text.red().to_string(),
                Style::Info => s.text.yellow().to_string(),
                Style::Plain => s.text.clone(),
            })
            .collect()
    }

    fn to_html(&self) -> String {
        self.segments
            .iter()
            .map(|s| match css_class(s.style) {
                Some(class) => format!("<span class='{}'>{}</span>", class, escape_html(&s.text)),
                None => escape_html(&s.text),
            })
            .collect()
    }
}

/// Headers plus rows of cells
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Table for the terminal in the given layout
    pub fn to_console(&self, style: TableStyle) -> String {
        let widths = self.widths();
        match style {
            TableStyle::Plain => self.plain(&widths),
            TableStyle::Grid => self.grid(&widths),
            TableStyle::Markdown => self.markdown(&widths),
        }
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.width());
                }
            }
        }
        widths
    }

    fn padded_headers(&self, widths: &[usize]) -> Vec<String> {
        self.headers
            .iter()
            .zip(widths)
            .map(|(h, w)| format!("{:<width$}", h, width = *w))
            .collect()
    }

    fn padded_cells(row: &[Cell], widths: &[usize]) -> Vec<String> {
        row.iter()
            .zip(widths)
            .map(|(cell, w)| {
                let pad = w.saturating_sub(cell.width());
                format!("{}{}", cell.to_console(), " ".repeat(pad))
            })
            .collect()
    }

    fn plain(&self, widths: &[usize]) -> String {
        let mut out = String::new();
        out.push_str(&self.padded_headers(widths).join("  ").bold().to_string());
        out.push('\n');

        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"━".repeat(total));
        out.push('\n');

        for row in &self.rows {
            out.push_str(Self::padded_cells(row, widths).join("  ").trim_end());
            out.push('\n');
        }
        out
    }

    fn grid(&self, widths: &[usize]) -> String {
        let rule = |left: &str, mid: &str, right: &str| {
            let parts: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{}{}{}\n", left, parts.join(mid), right)
        };
        let line = |cells: Vec<String>| {
            let inner: Vec<String> = cells.into_iter().map(|c| format!(" {} ", c)).collect();
            format!("│{}│\n", inner.join("│"))
        };

        let mut out = rule("┌", "┬", "┐");
        out.push_str(&line(
            self.padded_headers(widths)
                .into_iter()
                .map(|h| h.bold().to_string())
                .collect(),
        ));
        out.push_str(&rule("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&line(Self::padded_cells(row, widths)));
        }
        out.push_str(&rule("└", "┴", "┘"));
        out
    }

    fn markdown(&self, widths: &[usize]) -> String {
        let line = |cells: Vec<String>| format!("| {} |\n", cells.join(" | "));

        let mut out = line(self.padded_headers(widths));
        out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
        for row in &self.rows {
            let cells = row
                .iter()
                .zip(widths)
                .map(|(cell, w)| format!("{:<width$}", cell.text().replace('|', "\\|"), width = *w))
                .collect();
            out.push_str(&line(cells));
        }
        out
    }

    /// Standalone HTML page
    pub fn to_html(&self, title: &str) -> String {
        let headers: String = self
            .headers
            .iter()
            .map(|h| format!("<th>{}</th>", escape_html(h)))
            .collect();
        let content: String = self
            .rows
            .iter()
            .map(|row| {
                let cells: String = row.iter().map(|c| format!("<td>{}</td>", c.to_html())).collect();
                format!("<tr>{}</tr>\n", cells)
            })
            .collect();

        HTML_TEMPLATE
            .replace("{title}", &escape_html(title))
            .replace("{headers}", &headers)
            .replace("{content}", &content)
    }
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2em; }
  table { border-collapse: collapse; }
  th, td { padding: 0.3em 0.8em; border-bottom: 1px solid #ddd; text-align: left; }
  th { background: #f4f4f4; }
  .green-color { color: #1a7f37; }
  .red-color { color: #cf222e; }
  .orange-color { color: #bc4c00; }
</style>
</head>
<body>
<h1>{title}</h1>
<table>
<thead><tr>{headers}</tr></thead>
<tbody>
{content}</tbody>
</table>
</body>
</html>
"#;

fn css_class(style: Style) -> Option<&'static str> {
    match style {
        Style::Good => Some("green-color"),
        Style::Bad => Some("red-color"),
        Style::Info => Some("orange-color"),
        Style::Plain => None,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// One diff row: a file, or a function/class within it
#[derive(Debug, Clone)]
pub struct DiffRow {
    pub file: String,
    pub object: Option<String>,
    /// One per metric column, same order
    pub deltas: Vec<DeltaResult>,
}

impl DiffRow {
    /// `file` or `file:object`
    pub fn location(&self) -> String {
        match &self.object {
            Some(object) => format!("{}:{}", self.file, object),
            None => self.file.clone(),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.deltas.iter().any(DeltaResult::is_change)
    }
}

fn value_json(value: Option<&MetricValue>) -> Value {
    match value {
        Some(MetricValue::Numeric(n)) => json!(n),
        Some(MetricValue::Text(t)) => json!(t),
        None => Value::Null,
    }
}

/// `{"issues": [...]}` with one issue per diff row
pub fn diff_json(rows: &[DiffRow], columns: &[MetricColumn]) -> Value {
    let issues: Vec<Value> = rows
        .iter()
        .map(|row| {
            let mut issue = Map::new();
            issue.insert("location".into(), json!(row.file));
            match &row.object {
                Some(object) => issue.insert("Function".into(), json!(object)),
                None => issue.insert("File".into(), json!(row.file)),
            };
            for (column, delta) in columns.iter().zip(&row.deltas) {
                issue.insert(
                    column.metric.description.clone(),
                    json!({
                        "baseline": value_json(delta.baseline.as_ref()),
                        "current": value_json(delta.current.as_ref()),
                        "delta": delta.delta,
                        "direction": delta.direction.as_str(),
                    }),
                );
            }
            Value::Object(issue)
        })
        .collect();
    json!({ "issues": issues })
}

/// One plotted point; `label` becomes the hover text
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// A named line of points, ordered by revision
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

/// Line chart written as a standalone HTML page with inline SVG
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// X values are unix seconds, labelled as dates
    pub x_is_time: bool,
    pub series: Vec<Series>,
}

const CHART_WIDTH: f64 = 960.0;
const CHART_HEIGHT: f64 = 480.0;
const CHART_MARGIN: f64 = 70.0;
const Y_TICKS: usize = 5;

/// Series colours, cycled
const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

impl Chart {
    pub fn to_html(&self) -> String {
        let points = || self.series.iter().flat_map(|s| s.points.iter());
        let (x_min, x_max) = bounds(points().map(|p| p.x));
        let (y_min, y_max) = bounds(points().map(|p| p.y));

        let plot_w = CHART_WIDTH - 2.0 * CHART_MARGIN;
        let plot_h = CHART_HEIGHT - 2.0 * CHART_MARGIN;
        let sx = |x: f64| CHART_MARGIN + (x - x_min) / (x_max - x_min) * plot_w;
        let sy = |y: f64| CHART_HEIGHT - CHART_MARGIN - (y - y_min) / (y_max - y_min) * plot_h;
        let x_text = |x: f64| {
            if self.x_is_time {
                crate::util::format_date(x as i64)
            } else {
                format_number(x)
            }
        };

        let mut svg = String::new();
        let bottom = CHART_HEIGHT - CHART_MARGIN;
        let right = CHART_WIDTH - CHART_MARGIN;
        svg.push_str(&format!(
            "<line class='axis' x1='{m}' y1='{b}' x2='{r}' y2='{b}'/>\n<line class='axis' x1='{m}' y1='{m}' x2='{m}' y2='{b}'/>\n",
            m = CHART_MARGIN,
            b = bottom,
            r = right
        ));

        for i in 0..=Y_TICKS {
            let value = y_min + (y_max - y_min) * i as f64 / Y_TICKS as f64;
            let y = sy(value);
            svg.push_str(&format!(
                "<line class='grid' x1='{m}' y1='{y:.1}' x2='{r}' y2='{y:.1}'/>\n<text x='{tx}' y='{y:.1}' text-anchor='end'>{label}</text>\n",
                m = CHART_MARGIN,
                r = right,
                y = y,
                tx = CHART_MARGIN - 8.0,
                label = escape_html(&format_number(value))
            ));
        }
        for (value, anchor) in [(x_min, "start"), ((x_min + x_max) / 2.0, "middle"), (x_max, "end")] {
            svg.push_str(&format!(
                "<text x='{x:.1}' y='{y}' text-anchor='{anchor}'>{label}</text>\n",
                x = sx(value),
                y = bottom + 20.0,
                anchor = anchor,
                label = escape_html(&x_text(value))
            ));
        }
        svg.push_str(&format!(
            "<text class='label' x='{x}' y='{y}' text-anchor='middle'>{text}</text>\n",
            x = CHART_WIDTH / 2.0,
            y = CHART_HEIGHT - 20.0,
            text = escape_html(&self.x_label)
        ));
        svg.push_str(&format!(
            "<text class='label' x='20' y='{y}' text-anchor='middle' transform='rotate(-90 20 {y})'>{text}</text>\n",
            y = CHART_HEIGHT / 2.0,
            text = escape_html(&self.y_label)
        ));

        let mut legend = String::new();
        for (i, series) in self.series.iter().enumerate() {
            let colour = PALETTE[i % PALETTE.len()];
            let coords: Vec<String> = series
                .points
                .iter()
                .map(|p| format!("{:.1},{:.1}", sx(p.x), sy(p.y)))
                .collect();
            svg.push_str(&format!(
                "<polyline fill='none' stroke='{}' stroke-width='2' points='{}'/>\n",
                colour,
                coords.join(" ")
            ));
            for p in &series.points {
                svg.push_str(&format!(
                    "<circle cx='{:.1}' cy='{:.1}' r='3.5' fill='{}'><title>{}</title></circle>\n",
                    sx(p.x),
                    sy(p.y),
                    colour,
                    escape_html(&p.label)
                ));
            }
            legend.push_str(&format!(
                "<li><span class='swatch' style='background:{}'></span>{}</li>\n",
                colour,
                escape_html(&series.name)
            ));
        }

        CHART_TEMPLATE
            .replace("{title}", &escape_html(&self.title))
            .replace("{width}", &CHART_WIDTH.to_string())
            .replace("{height}", &CHART_HEIGHT.to_string())
            .replace("{svg}", &svg)
            .replace("{legend}", &legend)
    }
}

/// Min and max of `values`, widened so the range is never empty
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        (0.0, 1.0)
    } else if min == max {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

const CHART_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2em; }
  svg text { font-size: 12px; fill: #444; }
  svg text.label { font-size: 14px; fill: #222; }
  .axis { stroke: #333; }
  .grid { stroke: #eee; }
  .legend { list-style: none; padding: 0; }
  .legend li { margin: 0.2em 0; }
  .swatch { display: inline-block; width: 1em; height: 1em; margin-right: 0.5em; vertical-align: middle; }
</style>
</head>
<body>
<h1>{title}</h1>
<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
{svg}</svg>
<ul class="legend">
{legend}</ul>
</body>
</html>
"#;
