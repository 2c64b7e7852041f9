// src/exec/backend.rs

//! Pluggable recipe executor abstraction.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::engine::RecipeOutcome;
use crate::errors::Result;
use crate::types::TargetName;

use super::task_runner::run_recipe;

/// Shell used for recipes when the description does not name one.
pub const DEFAULT_SHELL: &str = "sh";

/// Everything an executor needs to produce one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeJob {
    pub target: TargetName,
    pub recipe: String,
    /// Every dependency of the target, in declaration order.
    pub inputs: Vec<TargetName>,
    /// The dependencies that were out of date when the target was
    /// scheduled.
    pub out_of_date: Vec<TargetName>,
    /// Directory the recipe runs in (the project root).
    pub workdir: PathBuf,
}

impl RecipeJob {
    pub fn inputs_joined(&self) -> String {
        self.inputs.join(" ")
    }

    pub fn out_of_date_joined(&self) -> String {
        self.out_of_date.join(" ")
    }
}

/// Trait abstracting how recipes are executed.
///
/// Production code uses [`ShellExecutor`]; tests can provide their own
/// implementation that doesn't spawn real processes. A non-zero exit is an
/// `Ok(RecipeOutcome::Failed(_))`; `Err` is reserved for failing to run the
/// recipe at all.
pub trait RecipeExecutor: Send {
    fn execute(
        &mut self,
        job: RecipeJob,
    ) -> Pin<Box<dyn Future<Output = Result<RecipeOutcome>> + Send + '_>>;
}

/// Runs recipes with `<shell> -c <recipe>`.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl RecipeExecutor for ShellExecutor {
    fn execute(
        &mut self,
        job: RecipeJob,
    ) -> Pin<Box<dyn Future<Output = Result<RecipeOutcome>> + Send + '_>> {
        let shell = self.shell.clone();
        Box::pin(async move { Ok(run_recipe(&shell, &job).await?) })
    }
}
