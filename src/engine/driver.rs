// src/engine/driver.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::cache::StalenessCache;
use crate::dag::BuildOrder;
use crate::engine::state::{BuildReport, RuleState, RuleStates};
use crate::engine::{DriverOptions, RecipeOutcome};
use crate::errors::{HashmakeError, Result};
use crate::exec::{RecipeExecutor, RecipeJob};
use crate::fs::SourceTree;
use crate::rules::{Rule, RuleKind, RuleStore};
use crate::types::TargetName;

type ProcessFuture<'f> = Pin<Box<dyn Future<Output = Result<()>> + 'f>>;

/// Brings every rule of a [`BuildOrder`] up to date, one at a time.
///
/// The driver owns only per-run state; rules, the cache and the executor
/// are borrowed from the caller so they can be inspected afterwards.
pub struct BuildDriver<'a> {
    rules: &'a RuleStore,
    cache: &'a mut StalenessCache,
    executor: &'a mut dyn RecipeExecutor,
    sources: SourceTree,
    options: DriverOptions,
    states: RuleStates,
    report: BuildReport,
}

impl<'a> BuildDriver<'a> {
    pub fn new(
        rules: &'a RuleStore,
        cache: &'a mut StalenessCache,
        executor: &'a mut dyn RecipeExecutor,
        sources: SourceTree,
        options: DriverOptions,
    ) -> Self {
        Self {
            rules,
            cache,
            executor,
            sources,
            options,
            states: RuleStates::default(),
            report: BuildReport::default(),
        }
    }

    /// Walk `order` front to back.
    ///
    /// The first failure aborts the run; digests recorded before it stay in
    /// the cache.
    pub async fn run(mut self, order: &BuildOrder) -> Result<BuildReport> {
        debug!(
            build_id = %self.cache.build_id(),
            rules = order.len(),
            force = self.options.force,
            "starting build"
        );

        for rule in order {
            self.process(Arc::clone(rule)).await?;
        }

        info!(
            executed = self.report.executed.len(),
            refreshed = self.report.refreshed.len(),
            grouped = self.report.grouped.len(),
            skipped = self.report.skipped.len(),
            "build finished"
        );
        Ok(self.report)
    }

    /// Bring one rule up to date.
    ///
    /// Boxed because building a target may recurse into its out-of-date
    /// dependencies.
    fn process(&mut self, rule: Arc<Rule>) -> ProcessFuture<'_> {
        Box::pin(async move {
            match self.states.get(&rule.target) {
                RuleState::Pending => {}
                RuleState::Building => {
                    // Only reachable through a cycle, which resolution rejects.
                    debug!(rule = %rule.target, "rule already in progress");
                    return Ok(());
                }
                RuleState::Built | RuleState::Skipped => return Ok(()),
            }

            if self.cache.was_rebuilt_this_run(&rule.target) {
                self.states.set(&rule.target, RuleState::Built);
                return Ok(());
            }

            match rule.kind {
                RuleKind::Filename => self.refresh_source(&rule),
                RuleKind::Explicit => self.build_explicit(rule).await,
            }
        })
    }

    fn refresh_source(&mut self, rule: &Rule) -> Result<()> {
        if !self.sources.file_exists(&rule.target) {
            error!(rule = %rule.target, "source file is missing and has no rule");
            return Err(HashmakeError::MissingSourceFile(rule.target.clone()));
        }

        if self.options.force || self.cache.is_stale(self.rules, &rule.target) {
            self.cache.record_rebuilt(self.rules, &rule.target)?;
            self.report.refreshed.push(rule.target.clone());
            self.states.set(&rule.target, RuleState::Built);
        } else {
            self.skip(rule);
        }
        Ok(())
    }

    async fn build_explicit(&mut self, rule: Arc<Rule>) -> Result<()> {
        if !self.options.force && !self.cache.is_stale(self.rules, &rule.target) {
            self.skip(&rule);
            return Ok(());
        }

        self.states.set(&rule.target, RuleState::Building);

        // Decided before anything below is rebuilt.
        let out_of_date = self.out_of_date_deps(&rule);
        for dep in &out_of_date {
            if self.cache.was_rebuilt_this_run(dep) {
                continue;
            }
            if let Some(dep_rule) = self.rules.find(dep) {
                self.process(dep_rule).await?;
            }
        }

        match &rule.recipe {
            Some(recipe) => {
                if !self.options.silent {
                    println!("Making target {}:", rule.target);
                }

                let job = RecipeJob {
                    target: rule.target.clone(),
                    recipe: recipe.clone(),
                    inputs: rule.deps.clone(),
                    out_of_date,
                    workdir: self.sources.root().to_path_buf(),
                };

                match self.executor.execute(job).await? {
                    RecipeOutcome::Success => {}
                    RecipeOutcome::Failed(code) => {
                        error!(rule = %rule.target, code, "recipe failed");
                        return Err(HashmakeError::RecipeFailed {
                            target: rule.target.clone(),
                            code,
                        });
                    }
                }

                self.cache.record_rebuilt(self.rules, &rule.target)?;
                self.report.executed.push(rule.target.clone());
            }
            None => {
                debug!(rule = %rule.target, "no recipe; recording as rebuilt");
                self.cache.record_rebuilt(self.rules, &rule.target)?;
                self.report.grouped.push(rule.target.clone());
            }
        }

        self.states.set(&rule.target, RuleState::Built);
        Ok(())
    }

    /// Dependencies rebuilt this run or stale, first occurrence order.
    ///
    /// Under `force` every dependency counts as out of date.
    fn out_of_date_deps(&self, rule: &Rule) -> Vec<TargetName> {
        let mut out: Vec<TargetName> = Vec::new();
        for dep in &rule.deps {
            if out.contains(dep) {
                continue;
            }
            if self.options.force
                || self.cache.was_rebuilt_this_run(dep)
                || self.cache.is_stale(self.rules, dep)
            {
                out.push(dep.clone());
            }
        }
        out
    }

    fn skip(&mut self, rule: &Rule) {
        debug!(rule = %rule.target, "up to date");
        self.states.set(&rule.target, RuleState::Skipped);
        self.report.skipped.push(rule.target.clone());
    }
}
