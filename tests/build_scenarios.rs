// tests/build_scenarios.rs

mod common;

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use hashmake::config::load_and_validate;
use hashmake::engine::BuildReport;
use hashmake::errors::HashmakeError;
use hashmake::fs::RealFileSystem;
use hashmake::{build, BuildRequest};
use tempfile::tempdir;

use crate::common::fake_executor::FakeExecutor;
use crate::common::{init_tracing, write_file};

type TestResult = Result<(), Box<dyn Error>>;

const A_FROM_B: &str = r#"
[[rule]]
target = "a"
deps = ["b"]
recipe = "R_a"
"#;

fn quiet() -> BuildRequest {
    BuildRequest {
        silent: true,
        ..Default::default()
    }
}

/// One invocation against a description on disk.
async fn invoke(
    description: &Path,
    request: &BuildRequest,
    exec: &mut FakeExecutor,
) -> Result<BuildReport, HashmakeError> {
    let fs = Arc::new(RealFileSystem);
    let desc = load_and_validate(fs.as_ref(), description, &request.params)?;
    build(fs, description, &desc, request, exec).await
}

#[tokio::test]
async fn hello_world_scenario_with_sqlite_cache() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let hm = write_file(dir.path(), "Hashmakefile.toml", A_FROM_B);
    write_file(dir.path(), "b", "hello");

    let mut exec = FakeExecutor::new();
    let report = invoke(&hm, &quiet(), &mut exec).await?;
    assert_eq!(exec.executed(), vec!["a"]);
    assert_eq!(report.refreshed, vec!["b"]);
    let job = &exec.jobs()[0];
    assert_eq!(job.inputs, vec!["b"]);
    assert_eq!(job.out_of_date, vec!["b"]);
    assert_eq!(job.workdir, dir.path());
    assert!(dir.path().join(".hashmake/cache.db").is_file());

    // Nothing changed: nothing runs.
    let mut exec = FakeExecutor::new();
    let report = invoke(&hm, &quiet(), &mut exec).await?;
    assert!(exec.executed().is_empty());
    assert!(report.is_up_to_date());

    // Same bytes written again: still nothing.
    write_file(dir.path(), "b", "hello");
    let mut exec = FakeExecutor::new();
    invoke(&hm, &quiet(), &mut exec).await?;
    assert!(exec.executed().is_empty());

    write_file(dir.path(), "b", "world");
    let mut exec = FakeExecutor::new();
    let report = invoke(&hm, &quiet(), &mut exec).await?;
    assert_eq!(exec.executed(), vec!["a"]);
    assert_eq!(report.refreshed, vec!["b"]);
    Ok(())
}

#[tokio::test]
async fn file_backend_persists_between_invocations() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let hm = write_file(
        dir.path(),
        "Hashmakefile.toml",
        &format!("[config]\ncache_backend = \"file\"\ncache_path = \"state/digests\"\n{A_FROM_B}"),
    );
    write_file(dir.path(), "b", "hello");

    invoke(&hm, &quiet(), &mut FakeExecutor::new()).await?;

    let digests = fs::read_to_string(dir.path().join("state/digests"))?;
    assert_eq!(digests.lines().count(), 2);
    assert!(digests.lines().all(|l| l.split('\t').count() == 3));

    let mut exec = FakeExecutor::new();
    invoke(&hm, &quiet(), &mut exec).await?;
    assert!(exec.executed().is_empty());
    Ok(())
}

#[tokio::test]
async fn memory_backend_forgets_everything() -> TestResult {
    let dir = tempdir()?;
    let hm = write_file(
        dir.path(),
        "Hashmakefile.toml",
        &format!("[config]\ncache_backend = \"memory\"\n{A_FROM_B}"),
    );
    write_file(dir.path(), "b", "hello");

    for _ in 0..2 {
        let mut exec = FakeExecutor::new();
        invoke(&hm, &quiet(), &mut exec).await?;
        assert_eq!(exec.executed(), vec!["a"]);
    }
    assert!(!dir.path().join(".hashmake").exists());
    Ok(())
}

#[tokio::test]
async fn force_rebuilds_an_up_to_date_closure() -> TestResult {
    let dir = tempdir()?;
    let hm = write_file(dir.path(), "Hashmakefile.toml", A_FROM_B);
    write_file(dir.path(), "b", "hello");
    invoke(&hm, &quiet(), &mut FakeExecutor::new()).await?;

    let request = BuildRequest {
        force: true,
        ..quiet()
    };
    let mut exec = FakeExecutor::new();
    let report = invoke(&hm, &request, &mut exec).await?;
    assert_eq!(exec.executed(), vec!["a"]);
    assert_eq!(report.refreshed, vec!["b"]);
    Ok(())
}

#[tokio::test]
async fn dry_run_executes_and_writes_nothing() -> TestResult {
    let dir = tempdir()?;
    let hm = write_file(dir.path(), "Hashmakefile.toml", A_FROM_B);
    write_file(dir.path(), "b", "hello");

    let request = BuildRequest {
        dry_run: true,
        ..quiet()
    };
    let mut exec = FakeExecutor::new();
    let report = invoke(&hm, &request, &mut exec).await?;

    assert!(exec.executed().is_empty());
    assert_eq!(report, BuildReport::default());
    assert!(!dir.path().join(".hashmake").exists());
    Ok(())
}

#[tokio::test]
async fn goal_comes_from_request_then_config_then_first_rule() -> TestResult {
    let dir = tempdir()?;
    let rules = r#"
[[rule]]
target = "first"
recipe = "one"

[[rule]]
target = "second"
recipe = "two"

[[rule]]
target = "third"
recipe = "three"
"#;
    let plain = write_file(dir.path(), "plain.toml", rules);
    let configured = write_file(
        dir.path(),
        "configured.toml",
        &format!("[config]\ngoal = \"second\"\ncache_backend = \"memory\"\n{rules}"),
    );

    let mut exec = FakeExecutor::new();
    invoke(&plain, &quiet(), &mut exec).await?;
    assert_eq!(exec.executed(), vec!["first"]);

    let mut exec = FakeExecutor::new();
    invoke(&configured, &quiet(), &mut exec).await?;
    assert_eq!(exec.executed(), vec!["second"]);

    let request = BuildRequest {
        goal: Some("third".into()),
        ..quiet()
    };
    let mut exec = FakeExecutor::new();
    invoke(&configured, &request, &mut exec).await?;
    assert_eq!(exec.executed(), vec!["third"]);
    Ok(())
}

#[tokio::test]
async fn changing_a_parameter_changes_the_recipe_digest() -> TestResult {
    let dir = tempdir()?;
    let hm = write_file(
        dir.path(),
        "Hashmakefile.toml",
        "[vars]\nCC = \"cc\"\n[[rule]]\ntarget = \"app\"\nrecipe = \"${CC} -o app\"\n",
    );

    let mut exec = FakeExecutor::new();
    invoke(&hm, &quiet(), &mut exec).await?;
    assert_eq!(exec.jobs()[0].recipe, "cc -o app");

    let mut exec = FakeExecutor::new();
    invoke(&hm, &quiet(), &mut exec).await?;
    assert!(exec.executed().is_empty());

    let request = BuildRequest {
        params: vec![("CC".into(), "clang".into())],
        ..quiet()
    };
    let mut exec = FakeExecutor::new();
    invoke(&hm, &request, &mut exec).await?;
    assert_eq!(exec.jobs()[0].recipe, "clang -o app");
    Ok(())
}

#[tokio::test]
async fn descriptions_sharing_a_cache_do_not_share_digests() -> TestResult {
    let dir = tempdir()?;
    let one = write_file(dir.path(), "one.toml", A_FROM_B);
    let two = write_file(dir.path(), "two.toml", A_FROM_B);
    write_file(dir.path(), "b", "hello");

    invoke(&one, &quiet(), &mut FakeExecutor::new()).await?;

    let mut exec = FakeExecutor::new();
    invoke(&two, &quiet(), &mut exec).await?;
    assert_eq!(exec.executed(), vec!["a"], "a different description is a different build");
    Ok(())
}

#[tokio::test]
async fn failed_recipe_keeps_digests_recorded_before_it() -> TestResult {
    let dir = tempdir()?;
    let hm = write_file(
        dir.path(),
        "Hashmakefile.toml",
        r#"
[[rule]]
target = "all"
deps = ["ok", "bad"]

[[rule]]
target = "ok"
deps = ["src.txt"]
recipe = "build ok"

[[rule]]
target = "bad"
recipe = "build bad"
"#,
    );
    write_file(dir.path(), "src.txt", "v1");

    let mut exec = FakeExecutor::new().failing("bad", 7);
    let err = invoke(&hm, &quiet(), &mut exec).await.unwrap_err();
    match err {
        HashmakeError::RecipeFailed { target, code } => {
            assert_eq!(target, "bad");
            assert_eq!(code, 7);
        }
        other => panic!("expected RecipeFailed, got {other:?}"),
    }

    let mut exec = FakeExecutor::new();
    let report = invoke(&hm, &quiet(), &mut exec).await?;
    assert_eq!(exec.executed(), vec!["bad"]);
    assert_eq!(report.grouped, vec!["all"]);
    Ok(())
}

#[tokio::test]
async fn nested_description_uses_its_directory_as_root() -> TestResult {
    let dir = tempdir()?;
    let hm = write_file(dir.path(), "sub/Hashmakefile.toml", A_FROM_B);
    write_file(dir.path(), "sub/b", "hello");

    let mut exec = FakeExecutor::new();
    invoke(&hm, &quiet(), &mut exec).await?;
    assert_eq!(exec.jobs()[0].workdir, dir.path().join("sub"));
    assert!(dir.path().join("sub/.hashmake/cache.db").is_file());
    Ok(())
}
