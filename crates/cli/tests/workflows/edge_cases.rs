//! Empty caches, bad input and cleanup

use crate::common::cli::TmCommand;
use crate::common::TestProject;
use crate::tm;
use anyhow::Result;

#[test]
fn test_commands_need_a_build_first() -> Result<()> {
    let project = TestProject::new()?;

    for args in [
        vec!["index"],
        vec!["report", "app.py"],
        vec!["diff", "app.py"],
        vec!["rank"],
        vec!["graph", "app.py", "raw.loc"],
    ] {
        let result = TmCommand::new(project.path()).args(&args).execute()?;
        assert!(!result.success(), "{:?} should fail", args);
        assert!(result.contains_stderr("run `tm build` first"), "{:?}: {}", args, result.stderr);
        // No guided setup without a terminal on stdin
        assert!(!result.contains_stderr("No tidemark cache found"), "{:?}", args);
    }
    assert!(!project.cache_dir().exists());

    Ok(())
}

#[test]
fn test_unknown_metric_is_rejected() -> Result<()> {
    let project = TestProject::new()?;
    tm!(project.path(), "build").assert_success()?;

    let result = tm!(project.path(), "report", "app.py", "cyclomatic.nope").assert_failure()?;
    assert!(result.contains_stderr("no metric 'nope'"));

    Ok(())
}

#[test]
fn test_unknown_operator_is_rejected() -> Result<()> {
    let project = TestProject::new()?;

    let result = tm!(project.path(), "build", "-o", "halstead").assert_failure()?;
    assert!(result.contains_stderr("unknown operator 'halstead'"));
    assert!(!project.cache_dir().exists());

    Ok(())
}

#[test]
fn test_clean_removes_the_cache() -> Result<()> {
    let project = TestProject::new()?;

    let nothing = tm!(project.path(), "clean", "-y").assert_success()?;
    assert!(nothing.contains_stdout("nothing to remove"));

    tm!(project.path(), "build").assert_success()?;
    assert!(project.cache_dir().exists());

    let result = tm!(project.path(), "clean", "-y").assert_success()?;
    assert!(result.contains_stdout("Removed"));
    assert!(!project.cache_dir().exists());

    tm!(project.path(), "index").assert_failure()?;

    Ok(())
}
