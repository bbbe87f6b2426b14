//! Compare the working tree against the index and rank indexed values

use crate::common::{fixtures, TestProject};
use crate::tm;
use anyhow::Result;

/// Project indexed at [`fixtures::APP_V2`]
fn indexed_project() -> Result<TestProject> {
    let project = TestProject::new()?;
    project.write("app.py", fixtures::APP_V2)?;
    tm!(project.path(), "build").assert_success()?;
    Ok(project)
}

#[test]
fn test_diff_json_reports_regressions() -> Result<()> {
    let project = indexed_project()?;
    project.write("app.py", fixtures::APP_V3)?;

    let result = tm!(project.path(), "diff", "app.py", "-m", "cyclomatic.complexity", "-f", "json")
        .assert_success()?;
    let json: serde_json::Value = serde_json::from_str(&result.stdout)?;
    let issues = json["issues"].as_array().expect("issues array");

    // File total 4 -> 5 and `check` 3 -> 4; `helper` unchanged
    assert_eq!(issues.len(), 2);
    let file = &issues[0];
    assert_eq!(file["location"], "app.py");
    assert_eq!(file["Cyclomatic Complexity"]["baseline"], 4.0);
    assert_eq!(file["Cyclomatic Complexity"]["current"], 5.0);
    assert_eq!(file["Cyclomatic Complexity"]["direction"], "regression");
    assert_eq!(issues[1]["location"], "app.py");
    assert_eq!(issues[1]["Function"], "check");

    Ok(())
}

#[test]
fn test_diff_without_changes() -> Result<()> {
    let project = indexed_project()?;

    let result = tm!(project.path(), "diff", "app.py").assert_success()?;
    assert!(result.contains_stdout("No metric changes found"));

    let all = tm!(project.path(), "diff", "app.py", "--all").assert_success()?;
    assert!(all.contains_stdout("app.py"));
    assert!(!all.contains_stdout("No metric changes found"));

    Ok(())
}

#[test]
fn test_diff_unknown_revision_fails() -> Result<()> {
    let project = indexed_project()?;

    let result = tm!(project.path(), "diff", "app.py", "-r", "zzzzzzzz").assert_failure()?;
    assert!(result.contains_stderr("unknown revision"));

    Ok(())
}

#[test]
fn test_rank_threshold_gate() -> Result<()> {
    let project = indexed_project()?;

    let ranked = tm!(project.path(), "rank", "app.py", "cyclomatic.complexity", "--desc")
        .assert_success()?;
    assert!(ranked.contains_stdout("app.py:check"));
    assert!(ranked.contains_stdout("Total"));

    tm!(project.path(), "rank", "app.py", "cyclomatic.complexity", "--threshold", "1")
        .assert_success()?;
    let failed = tm!(project.path(), "rank", "app.py", "cyclomatic.complexity", "--threshold", "100")
        .assert_failure()?;
    assert!(failed.contains_stderr("below the threshold"));

    Ok(())
}
