//! Plot indexed history as an HTML chart

use crate::common::{fixtures, TestProject};
use crate::tm;
use anyhow::Result;

/// Two filesystem revisions of `app.py`: complexity 2, then 4
fn two_revisions() -> Result<TestProject> {
    let project = TestProject::new()?;
    tm!(project.path(), "build").assert_success()?;
    project.write("app.py", fixtures::APP_V2)?;
    tm!(project.path(), "build").assert_success()?;
    Ok(project)
}

#[test]
fn test_graph_writes_chart_under_project_root() -> Result<()> {
    let project = two_revisions()?;

    let result = tm!(project.path(), "graph", "app.py", "cyclomatic.complexity").assert_success()?;
    assert!(result.contains_stdout("Graph saved to"));

    let html = std::fs::read_to_string(project.path().join("tidemark_graph/index.html"))?;
    assert!(html.contains("<polyline"));
    assert!(html.contains("Cyclomatic Complexity"));
    assert_eq!(html.matches("<circle").count(), 2);

    Ok(())
}

#[test]
fn test_graph_against_metric_axis() -> Result<()> {
    let project = two_revisions()?;

    tm!(
        project.path(),
        "graph",
        ".",
        "cyclomatic.complexity",
        "raw.loc",
        "-x",
        "raw.sloc",
        "-o",
        "charts/sloc.html"
    )
    .assert_success()?;

    let html = std::fs::read_to_string(project.path().join("charts/sloc.html"))?;
    assert!(html.contains("Source Lines of Code"));
    assert!(html.contains("app.py Lines of Code"));

    Ok(())
}

#[test]
fn test_graph_rejects_text_metric() -> Result<()> {
    let project = two_revisions()?;

    let result = tm!(project.path(), "graph", "app.py", "maintainability.rank").assert_failure()?;
    assert!(result.contains_stderr("text metric"));
    assert!(!project.path().join("tidemark_graph").exists());

    Ok(())
}

#[test]
fn test_graph_unknown_path_fails() -> Result<()> {
    let project = two_revisions()?;

    let result = tm!(project.path(), "graph", "missing.py", "raw.loc").assert_failure()?;
    assert!(result.contains_stderr("no indexed data for missing.py"));

    Ok(())
}
