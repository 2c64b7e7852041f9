// src/engine/mod.rs

//! Build driver.
//!
//! Walks a resolved [`BuildOrder`](crate::dag::BuildOrder), asks the
//! [`StalenessCache`](crate::cache::StalenessCache) what is out of date,
//! hands recipes to a [`RecipeExecutor`](crate::exec::RecipeExecutor) and
//! records fresh digests. Everything runs strictly one target at a time.
//!
//! - [`driver`] holds the [`BuildDriver`] itself.
//! - [`state`] holds the per-rule run state and the [`BuildReport`].

/// Outcome of a recipe process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeOutcome {
    Success,
    Failed(i32),
}

/// Options for one build run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverOptions {
    /// Rebuild every rule in the order, stale or not.
    pub force: bool,
    /// Suppress the `Making target X:` banners.
    pub silent: bool,
}

pub mod driver;
pub mod state;

pub use driver::BuildDriver;
pub use state::{BuildReport, RuleState};
