// tests/error_handling.rs

mod common;

use std::io::Write;
use std::sync::Arc;

use hashmake::config::load_and_validate;
use hashmake::errors::HashmakeError;
use hashmake::fs::RealFileSystem;
use hashmake::{build, BuildRequest};
use tempfile::{tempdir, NamedTempFile};

use crate::common::fake_executor::FakeExecutor;
use crate::common::write_file;

fn quiet() -> BuildRequest {
    BuildRequest {
        silent: true,
        ..Default::default()
    }
}

async fn build_file(contents: &str, request: BuildRequest) -> Result<Vec<String>, HashmakeError> {
    let dir = tempdir().unwrap();
    let hm = write_file(dir.path(), "Hashmakefile.toml", contents);
    let fs = Arc::new(RealFileSystem);
    let desc = load_and_validate(fs.as_ref(), &hm, &[])?;
    let mut exec = FakeExecutor::new();
    build(fs, &hm, &desc, &request, &mut exec).await?;
    Ok(exec.executed())
}

#[tokio::test]
async fn test_two_rule_cycle_returns_structured_error() {
    let result = build_file(
        r#"
[[rule]]
target = "A"
deps = ["B"]
recipe = "echo A"

[[rule]]
target = "B"
deps = ["A"]
recipe = "echo B"
"#,
        quiet(),
    )
    .await;

    match result {
        Err(HashmakeError::CycleDetected { target, chain }) => {
            assert!(target == "A" || target == "B");
            assert_eq!(chain.first(), chain.last());
        }
        Err(e) => panic!("Expected CycleDetected error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[tokio::test]
async fn test_cycle_outside_the_goal_closure_does_not_block_the_build() {
    let executed = build_file(
        r#"
[[rule]]
target = "fine"
recipe = "echo fine"

[[rule]]
target = "x"
deps = ["y"]

[[rule]]
target = "y"
deps = ["x"]
"#,
        quiet(),
    )
    .await
    .unwrap();

    assert_eq!(executed, vec!["fine"]);
}

#[tokio::test]
async fn test_unknown_goal_returns_unknown_goal() {
    let request = BuildRequest {
        goal: Some("nope".into()),
        ..quiet()
    };
    let result = build_file("[[rule]]\ntarget = \"a\"\nrecipe = \"true\"\n", request).await;

    match result {
        Err(HashmakeError::UnknownGoal(goal)) => assert_eq!(goal, "nope"),
        other => panic!("Expected UnknownGoal, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_source_file_names_the_file() {
    let result = build_file(
        "[[rule]]\ntarget = \"app\"\ndeps = [\"main.c\"]\nrecipe = \"cc main.c\"\n",
        quiet(),
    )
    .await;

    match result {
        Err(e @ HashmakeError::MissingSourceFile(_)) => {
            assert_eq!(e.target(), Some("main.c"));
            assert!(e.to_string().contains("main.c"));
        }
        other => panic!("Expected MissingSourceFile, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_unusable_cache_is_cache_unavailable() {
    let dir = tempdir().unwrap();
    // A directory where the database should be.
    std::fs::create_dir_all(dir.path().join("blocked.db")).unwrap();
    let hm = write_file(
        dir.path(),
        "Hashmakefile.toml",
        "[config]\ncache_path = \"blocked.db\"\n[[rule]]\ntarget = \"a\"\nrecipe = \"true\"\n",
    );

    let fs = Arc::new(RealFileSystem);
    let desc = load_and_validate(fs.as_ref(), &hm, &[]).unwrap();
    let mut exec = FakeExecutor::new();
    let err = build(fs, &hm, &desc, &quiet(), &mut exec).await.unwrap_err();

    assert!(matches!(err, HashmakeError::CacheUnavailable(_)));
    assert!(exec.executed().is_empty());
}

#[test]
fn test_description_without_rules_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[vars]\nX = \"1\"\n").unwrap();

    let result = load_and_validate(&RealFileSystem, file.path(), &[]);
    match result {
        Err(HashmakeError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_invalid_toml_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[[rule]]\ntarget = \"a\"\ndeps = \"not-a-list\"\n").unwrap();

    let result = load_and_validate(&RealFileSystem, file.path(), &[]);
    assert!(matches!(result, Err(HashmakeError::TomlError(_))));
}

#[test]
fn test_missing_description_returns_config_error() {
    let dir = tempdir().unwrap();
    let result = load_and_validate(&RealFileSystem, dir.path().join("Hashmakefile.toml"), &[]);
    assert!(matches!(result, Err(HashmakeError::ConfigError(_))));
}
