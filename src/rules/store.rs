// src/rules/store.rs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::rules::rule::{Rule, RuleKind};
use crate::types::TargetName;

/// All rules known to one invocation, keyed by target name.
///
/// Rules are handed out as `Arc<Rule>`; redeclaring a target swaps in a new
/// rule value rather than mutating the old one, so anything already holding
/// the previous `Arc` keeps a consistent snapshot.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: HashMap<TargetName, Arc<Rule>>,
    /// Explicitly declared targets, first declaration order.
    declared: Vec<TargetName>,
    goal: Option<TargetName>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) an explicit rule.
    ///
    /// - An existing rule keeps its slot; its deps and recipe are replaced.
    ///   A synthesized filename rule is upgraded to an explicit one.
    /// - The first declared target becomes the goal if none was set.
    pub fn declare(
        &mut self,
        target: impl Into<TargetName>,
        deps: Vec<TargetName>,
        recipe: Option<String>,
    ) {
        let target = target.into();

        let rule = match self.rules.get(&target) {
            Some(existing) => {
                debug!(rule = %target, "redeclaring rule; overwriting deps and recipe");
                Rule {
                    deps,
                    recipe,
                    kind: RuleKind::Explicit,
                    ..Rule::clone(existing)
                }
            }
            None => Rule::explicit(target.clone(), deps, recipe),
        };

        if !self.declared.contains(&target) {
            self.declared.push(target.clone());
        }
        if self.goal.is_none() {
            debug!(goal = %target, "first declared target becomes the implicit goal");
            self.goal = Some(target.clone());
        }

        self.rules.insert(target, Arc::new(rule));
    }

    /// Mark a declared target as always out of date.
    ///
    /// Returns `false` if there is no rule for `target`.
    pub fn set_always_stale(&mut self, target: &str, always: bool) -> bool {
        match self.rules.get_mut(target) {
            Some(rule) => {
                Arc::make_mut(rule).always_stale = always;
                true
            }
            None => false,
        }
    }

    pub fn find(&self, target: &str) -> Option<Arc<Rule>> {
        self.rules.get(target).cloned()
    }

    /// Return the rule for `target`, synthesizing a filename rule if there
    /// is none. Never replaces an existing rule.
    pub fn find_or_synthesize_filename(&mut self, target: &str) -> Arc<Rule> {
        if let Some(rule) = self.rules.get(target) {
            return Arc::clone(rule);
        }

        debug!(rule = %target, "no rule declared; synthesizing filename rule");
        let rule = Arc::new(Rule::filename(target));
        self.rules.insert(target.to_string(), Arc::clone(&rule));
        rule
    }

    /// Whether `target` has an explicitly declared rule.
    pub fn target_declared(&self, target: &str) -> bool {
        self.rules
            .get(target)
            .is_some_and(|r| r.kind == RuleKind::Explicit)
    }

    pub fn goal(&self) -> Option<&str> {
        self.goal.as_deref()
    }

    /// Designate the goal explicitly (e.g. from the command line).
    pub fn set_goal(&mut self, target: impl Into<TargetName>) {
        self.goal = Some(target.into());
    }

    /// Explicitly declared targets in first-declaration order.
    pub fn declared_targets(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(|s| s.as_str())
    }

    /// Number of rules, synthesized ones included.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
