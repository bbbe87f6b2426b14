//! Build the index, then read it back through `index` and `report`

use crate::common::{fixtures, TestProject};
use crate::tm;
use anyhow::Result;

#[test]
fn test_build_then_index() -> Result<()> {
    let project = TestProject::new()?;

    let build = tm!(project.path(), "build").assert_success()?;
    assert!(build.contains_stdout("Build Complete"));
    assert!(project.cache_dir().join("index.db").exists());

    let index = tm!(project.path(), "index").assert_success()?;
    assert!(index.contains_stdout("1 revisions, archiver"));
    assert!(index.contains_stdout("Latest:"));

    Ok(())
}

#[test]
fn test_rebuild_without_changes_is_a_no_op() -> Result<()> {
    let project = TestProject::new()?;

    tm!(project.path(), "build").assert_success()?;
    let again = tm!(project.path(), "build").assert_success()?;

    assert!(again.contains_stdout("Already indexed:  1"));
    assert!(again.contains_stdout("Revisions total:  1"));

    Ok(())
}

#[test]
fn test_report_tracks_complexity_across_builds() -> Result<()> {
    let project = TestProject::new()?;
    tm!(project.path(), "build").assert_success()?;

    project.write("app.py", fixtures::APP_V2)?;
    tm!(project.path(), "build").assert_success()?;

    let report = tm!(project.path(), "report", "app.py", "cyclomatic.complexity").assert_success()?;
    assert!(report.contains_stdout("History for"));
    assert!(report.contains_stdout("Cyclomatic Complexity"));
    // Newest row: 4 with a +2 delta; oldest row: plain 2
    assert!(report.contains_stdout("4 ("));
    assert!(report.contains_stdout("+2"));

    let index = tm!(project.path(), "index").assert_success()?;
    assert!(index.contains_stdout("2 revisions"));

    Ok(())
}

#[test]
fn test_html_report_is_written() -> Result<()> {
    let project = TestProject::new()?;
    tm!(project.path(), "build").assert_success()?;

    let result = tm!(project.path(), "report", "app.py", "-f", "html", "-o", "out/report.html")
        .assert_success()?;
    assert!(result.contains_stdout("Report saved to"));

    let html = std::fs::read_to_string(project.path().join("out/report.html"))?;
    assert!(html.contains("<table"));
    assert!(html.contains("app.py"));

    Ok(())
}

#[test]
fn test_default_html_report_lands_in_project_root() -> Result<()> {
    let project = TestProject::new()?;
    project.write("sub/keep.txt", "")?;
    tm!(project.path(), "build").assert_success()?;

    tm!(project.path().join("sub"), "-p", "..", "report", "app.py", "-f", "html").assert_success()?;

    assert!(project.path().join("tidemark_report/index.html").exists());
    assert!(!project.path().join("sub/tidemark_report").exists());

    Ok(())
}

#[test]
fn test_report_grid_layout() -> Result<()> {
    let project = TestProject::new()?;
    tm!(project.path(), "build").assert_success()?;

    let grid = tm!(project.path(), "report", "app.py", "--console-format", "grid").assert_success()?;
    assert!(grid.contains_stdout("┌"));
    assert!(grid.contains_stdout("└"));

    let markdown = tm!(project.path(), "report", "app.py", "--console-format", "markdown").assert_success()?;
    assert!(markdown.contains_stdout("| Revision |"));

    Ok(())
}

#[test]
fn test_list_metrics() -> Result<()> {
    let project = TestProject::new()?;

    let result = tm!(project.path(), "list-metrics").assert_success()?;
    assert!(result.contains_stdout("cyclomatic.complexity"));
    assert!(result.contains_stdout("maintainability.mi"));
    assert!(result.contains_stdout("raw.loc"));

    Ok(())
}
