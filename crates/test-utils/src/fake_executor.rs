use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use hashmake::engine::RecipeOutcome;
use hashmake::errors::Result;
use hashmake::exec::{RecipeExecutor, RecipeJob};

/// A fake executor that:
/// - records every job it is handed, in order
/// - reports `Success`, or `Failed(code)` for targets set up to fail
/// - never spawns a process.
///
/// Clones share the same record, so a test can keep one handle and pass
/// another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    jobs: Arc<Mutex<Vec<RecipeJob>>>,
    failures: HashMap<String, i32>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the recipe for `target` exit with `code`.
    pub fn failing(mut self, target: &str, code: i32) -> Self {
        self.failures.insert(target.to_string(), code);
        self
    }

    pub fn jobs(&self) -> Vec<RecipeJob> {
        self.jobs.lock().unwrap().clone()
    }

    /// Targets whose recipe ran, in order.
    pub fn executed(&self) -> Vec<String> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|j| j.target.clone())
            .collect()
    }
}

impl RecipeExecutor for FakeExecutor {
    fn execute(
        &mut self,
        job: RecipeJob,
    ) -> Pin<Box<dyn Future<Output = Result<RecipeOutcome>> + Send + '_>> {
        let outcome = match self.failures.get(&job.target) {
            Some(&code) => RecipeOutcome::Failed(code),
            None => RecipeOutcome::Success,
        };
        let jobs = Arc::clone(&self.jobs);

        Box::pin(async move {
            jobs.lock().unwrap().push(job);
            Ok(outcome)
        })
    }
}
