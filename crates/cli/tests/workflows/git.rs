//! Build from a real git history

use crate::common::{fixtures, TestProject};
use crate::tm;
use anyhow::Result;

/// Two commits of `app.py`: complexity 2, then 4
fn git_project() -> Result<TestProject> {
    let project = TestProject::with_git()?;
    project.commit("app.py", fixtures::APP_V1, "add check", 1_700_000_000)?;
    project.commit("app.py", fixtures::APP_V2, "add helper", 1_700_000_100)?;
    Ok(project)
}

#[test]
fn test_build_indexes_every_commit_once() -> Result<()> {
    let project = git_project()?;

    let build = tm!(project.path(), "build").assert_success()?;
    assert!(build.contains_stdout("Build Complete"));
    assert!(build.contains_stdout("Revisions total:  2"));

    let again = tm!(project.path(), "build").assert_success()?;
    assert!(again.contains_stdout("Already indexed:  2"));
    assert!(again.contains_stdout("Revisions total:  2"));

    // Newest commit first
    let index = tm!(project.path(), "index", "-m").assert_success()?;
    assert!(index.contains_stdout("2 revisions, archiver"));
    let newer = index.stdout.find("add helper").expect("newest commit listed");
    let older = index.stdout.find("add check").expect("oldest commit listed");
    assert!(newer < older);

    Ok(())
}

#[test]
fn test_report_reads_committed_trees() -> Result<()> {
    let project = git_project()?;
    // Uncommitted edits never reach the index
    project.write("app.py", fixtures::APP_V3)?;
    tm!(project.path(), "build").assert_success()?;

    let report = tm!(project.path(), "report", "app.py", "cyclomatic.complexity").assert_success()?;
    assert!(report.contains_stdout("4 ("));
    assert!(report.contains_stdout("+2"));
    assert!(!report.contains_stdout("5 ("));

    // The scratch checkout holds the last materialized commit
    let checkout = std::fs::read_to_string(project.cache_dir().join("checkout/app.py"))?;
    assert_eq!(checkout, fixtures::APP_V2);

    Ok(())
}

#[test]
fn test_diff_against_parent_commit() -> Result<()> {
    let project = git_project()?;
    tm!(project.path(), "build").assert_success()?;

    let result = tm!(
        project.path(),
        "diff",
        "app.py",
        "-r",
        "HEAD~1",
        "-m",
        "cyclomatic.complexity",
        "-f",
        "json"
    )
    .assert_success()?;
    let json: serde_json::Value = serde_json::from_str(&result.stdout)?;
    let issues = json["issues"].as_array().expect("issues array");

    let file = &issues[0];
    assert_eq!(file["location"], "app.py");
    assert_eq!(file["Cyclomatic Complexity"]["baseline"], 2.0);
    assert_eq!(file["Cyclomatic Complexity"]["current"], 4.0);

    Ok(())
}

#[test]
fn test_new_commit_is_appended() -> Result<()> {
    let project = git_project()?;
    tm!(project.path(), "build").assert_success()?;

    project.commit("app.py", fixtures::APP_V3, "widen check", 1_700_000_200)?;
    let build = tm!(project.path(), "build").assert_success()?;
    assert!(build.contains_stdout("Already indexed:  2"));
    assert!(build.contains_stdout("Revisions total:  3"));

    let report = tm!(project.path(), "report", "app.py", "cyclomatic.complexity").assert_success()?;
    assert!(report.contains_stdout("5 ("));
    assert!(report.contains_stdout("+1"));

    Ok(())
}
