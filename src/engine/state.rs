// src/engine/state.rs

//! Per-rule run state and the end-of-run report.

use std::collections::HashMap;

use crate::types::TargetName;

/// Where a rule is within the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    /// Not looked at yet.
    Pending,
    /// Out-of-date dependencies are being built or the recipe is running.
    Building,
    /// Rebuilt (or, for a source file, its digest refreshed) this run.
    Built,
    /// Up to date; nothing done.
    Skipped,
}

/// What a build run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Targets whose recipe ran, in execution order.
    pub executed: Vec<TargetName>,
    /// Source files whose cached digest was refreshed.
    pub refreshed: Vec<TargetName>,
    /// Recipe-less targets recorded as rebuilt.
    pub grouped: Vec<TargetName>,
    /// Targets found up to date.
    pub skipped: Vec<TargetName>,
}

impl BuildReport {
    /// Nothing was rebuilt or refreshed.
    pub fn is_up_to_date(&self) -> bool {
        self.executed.is_empty() && self.refreshed.is_empty() && self.grouped.is_empty()
    }
}

/// Side table of rule states, keyed by target.
#[derive(Debug, Default)]
pub(crate) struct RuleStates {
    states: HashMap<TargetName, RuleState>,
}

impl RuleStates {
    pub(crate) fn get(&self, target: &str) -> RuleState {
        self.states
            .get(target)
            .copied()
            .unwrap_or(RuleState::Pending)
    }

    pub(crate) fn set(&mut self, target: &str, state: RuleState) {
        self.states.insert(target.to_string(), state);
    }
}
