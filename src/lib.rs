// src/lib.rs

pub mod cache;
pub mod cli;
pub mod config;
pub mod dag;
pub mod digest;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod rules;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{open_store, open_store_read_only, BuildId, StalenessCache};
use crate::cli::CliArgs;
use crate::config::{load_and_validate, Description};
use crate::dag::{resolve, BuildOrder};
use crate::engine::{BuildDriver, BuildReport, DriverOptions};
use crate::errors::{HashmakeError, Result};
use crate::exec::{RecipeExecutor, ShellExecutor};
use crate::fs::{project_root, FileSystem, RealFileSystem, SourceTree};
use crate::rules::{RuleKind, RuleStore};

/// What one invocation was asked to do, independent of how it was asked.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Overrides `[config].goal` and the first declared target.
    pub goal: Option<String>,
    /// `NAME=VALUE` parameters, in command-line order.
    pub params: Vec<(String, String)>,
    pub force: bool,
    pub silent: bool,
    pub dry_run: bool,
}

impl BuildRequest {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let (goal, params) = args.goal_and_params()?;
        Ok(Self {
            goal,
            params,
            force: args.force,
            silent: args.silent,
            dry_run: args.dry_run,
        })
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - description loading (includes, variables, parameters)
/// - goal resolution
/// - the staleness cache backend
/// - the shell executor and the build driver
pub async fn run(args: CliArgs) -> Result<BuildReport> {
    let request = BuildRequest::from_args(&args)?;
    let description_path = args.file.clone();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let description = load_and_validate(fs.as_ref(), &description_path, &request.params)?;
    let mut executor = ShellExecutor::new(description.config().shell());

    build(fs, &description_path, &description, &request, &mut executor).await
}

/// Build the requested goal of an already loaded description.
///
/// A dry run resolves the order and prints it with each rule's staleness;
/// it runs no recipe and never creates a cache.
pub async fn build(
    fs: Arc<dyn FileSystem>,
    description_path: &Path,
    description: &Description,
    request: &BuildRequest,
    executor: &mut dyn RecipeExecutor,
) -> Result<BuildReport> {
    let root = project_root(description_path);
    let sources = SourceTree::new(Arc::clone(&fs), root.clone());

    let mut rules = RuleStore::new();
    description.declare_into(&mut rules);
    if let Some(goal) = &request.goal {
        rules.set_goal(goal.clone());
    }
    let goal = rules
        .goal()
        .map(str::to_string)
        .ok_or_else(|| HashmakeError::ConfigError("no goal to build".to_string()))?;
    info!(goal = %goal, root = ?root, "resolving goal");

    let order = resolve(&mut rules, &goal, &sources)?;

    let build_id = BuildId::new(
        fs.canonicalize(description_path)
            .unwrap_or_else(|_| description_path.to_path_buf())
            .display()
            .to_string(),
    );
    debug!(build_id = %build_id, "build identity");

    let config = description.config();
    let cache_path = config.cache_path.as_deref();

    if request.dry_run {
        let store = open_store_read_only(config.cache_backend(), &root, cache_path)?;
        let cache = StalenessCache::new(build_id, store, sources.clone());
        print_dry_run(&goal, &order, &rules, &cache, &sources, request.force);
        return Ok(BuildReport::default());
    }

    let store = open_store(config.cache_backend(), &root, cache_path)?;
    let mut cache = StalenessCache::new(build_id, store, sources.clone());

    let options = DriverOptions {
        force: request.force,
        silent: request.silent,
    };
    let driver = BuildDriver::new(&rules, &mut cache, executor, sources, options);
    let report = driver.run(&order).await?;

    if report.executed.is_empty() && !request.silent {
        println!("hashmake: '{goal}' is up to date.");
    }
    Ok(report)
}

/// Print the build order, one rule per line, with its staleness.
fn print_dry_run(
    goal: &str,
    order: &BuildOrder,
    rules: &RuleStore,
    cache: &StalenessCache,
    sources: &SourceTree,
    force: bool,
) {
    println!("hashmake dry-run (goal: {goal})");
    for line in dry_run_lines(order, rules, cache, sources, force) {
        println!("  {line}");
    }
    debug!("dry-run complete (no execution)");
}

/// `rule [status]` for each rule of `order`, where status is one of
/// `missing`, `forced`, `stale` or `up to date`.
pub fn dry_run_lines(
    order: &BuildOrder,
    rules: &RuleStore,
    cache: &StalenessCache,
    sources: &SourceTree,
    force: bool,
) -> Vec<String> {
    order
        .iter()
        .map(|rule| {
            let status = if rule.kind == RuleKind::Filename && !sources.file_exists(&rule.target)
            {
                "missing"
            } else if force {
                "forced"
            } else if cache.is_stale(rules, &rule.target) {
                "stale"
            } else {
                "up to date"
            };
            format!("{rule} [{status}]")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{HashStore, MemoryHashStore};
    use crate::digest::fingerprint;
    use crate::fs::mock::MockFileSystem;

    const ID: &str = "Hashmakefile.toml";

    struct Fixture {
        fs: MockFileSystem,
        rules: RuleStore,
        store: MemoryHashStore,
    }

    /// `app` links `a.o` and `b.o`; `a.c` changed since the last run,
    /// `b.c` did not, and `gone.h` was deleted.
    fn fixture() -> Fixture {
        let fs = MockFileSystem::new();
        fs.add_file("a.c", "a v2");
        fs.add_file("b.c", "b v1");

        let mut rules = RuleStore::new();
        rules.declare("app", vec!["a.o".into(), "b.o".into(), "gone.h".into()], Some("link".into()));
        rules.declare("a.o", vec!["a.c".into()], Some("cc a.c".into()));
        rules.declare("b.o", vec!["b.c".into()], Some("cc b.c".into()));

        let mut store = MemoryHashStore::new();
        for (target, digest) in [
            ("a.c", fingerprint("a v1")),
            ("b.c", fingerprint("b v1")),
            ("gone.h", fingerprint("#pragma once")),
            ("a.o", fingerprint("cc a.c")),
            ("b.o", fingerprint("cc b.c")),
            ("app", fingerprint("link")),
        ] {
            store.save(ID, target, &digest.to_hex()).unwrap();
        }

        Fixture { fs, rules, store }
    }

    fn lines(fixture: Fixture, force: bool) -> Vec<String> {
        let Fixture { fs, mut rules, store } = fixture;
        let sources = SourceTree::new(Arc::new(fs), ".");
        let order = resolve(&mut rules, "app", &sources).unwrap();
        let cache = StalenessCache::new(BuildId::new(ID), Box::new(store), sources.clone());
        dry_run_lines(&order, &rules, &cache, &sources, force)
    }

    #[test]
    fn dry_run_reports_each_rule_with_its_staleness() {
        assert_eq!(
            lines(fixture(), false),
            vec![
                "a.c: (filename) [stale]",
                "a.o: a.c (explicit)(recipe) [stale]",
                "b.c: (filename) [up to date]",
                "b.o: b.c (explicit)(recipe) [up to date]",
                "gone.h: (filename) [missing]",
                "app: a.o b.o gone.h (explicit)(recipe) [stale]",
            ]
        );
    }

    #[test]
    fn forced_dry_run_marks_present_rules_forced() {
        let all = lines(fixture(), true);
        assert_eq!(all[2], "b.c: (filename) [forced]");
        assert_eq!(all[4], "gone.h: (filename) [missing]");
        assert_eq!(all[5], "app: a.o b.o gone.h (explicit)(recipe) [forced]");
    }

    #[test]
    fn unchanged_closure_is_up_to_date() {
        let mut fixture = fixture();
        fixture.fs.add_file("a.c", "a v1");
        fixture.fs.add_file("gone.h", "#pragma once");

        let all = lines(fixture, false);
        assert!(all.iter().all(|l| l.ends_with("[up to date]")), "{all:?}");
    }
}
