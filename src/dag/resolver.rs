// src/dag/resolver.rs

//! Depth-first topological sort with cycle detection.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error};

use crate::dag::build_order::BuildOrder;
use crate::errors::{HashmakeError, Result};
use crate::fs::SourceTree;
use crate::rules::{Rule, RuleStore};
use crate::types::TargetName;

/// Per-node state during one sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitState {
    #[default]
    Unmarked,
    /// On the current DFS path; meeting it again means a cycle.
    InProgress,
    /// Already placed in the output.
    Done,
}

/// Compute the build order for `goal`.
///
/// An undeclared goal that names an existing file under the project root
/// gets a filename rule (there is nothing to do but check it); any other
/// undeclared goal is [`HashmakeError::UnknownGoal`]. Dependencies without a
/// rule always get a synthesized filename rule; whether the file exists is
/// the driver's concern, not the resolver's.
pub fn resolve(rules: &mut RuleStore, goal: &str, sources: &SourceTree) -> Result<BuildOrder> {
    if rules.find(goal).is_none() {
        if sources.file_exists(goal) {
            debug!(goal = %goal, "goal has no rule but exists as a file");
        } else {
            error!(goal = %goal, "no rule to make goal");
            return Err(HashmakeError::UnknownGoal(goal.to_string()));
        }
    }

    let mut resolver = Resolver::new(rules);
    resolver.visit(goal)?;

    let order = BuildOrder::from_post_order(resolver.order);
    debug!(goal = %goal, rules = order.len(), "resolved build order");
    Ok(order)
}

struct Resolver<'a> {
    rules: &'a mut RuleStore,
    marks: HashMap<TargetName, VisitState>,
    /// Current DFS path, for naming the cycle.
    path: Vec<TargetName>,
    order: Vec<Arc<Rule>>,
}

impl<'a> Resolver<'a> {
    fn new(rules: &'a mut RuleStore) -> Self {
        Self {
            rules,
            marks: HashMap::new(),
            path: Vec::new(),
            order: Vec::new(),
        }
    }

    fn mark(&self, target: &str) -> VisitState {
        self.marks.get(target).copied().unwrap_or_default()
    }

    fn visit(&mut self, target: &str) -> Result<()> {
        match self.mark(target) {
            VisitState::Done => Ok(()),
            VisitState::InProgress => Err(self.cycle_error(target)),
            VisitState::Unmarked => {
                self.marks.insert(target.to_string(), VisitState::InProgress);
                self.path.push(target.to_string());

                // Look the rule up now, not from an earlier snapshot.
                let rule = self.rules.find_or_synthesize_filename(target);
                for dep in &rule.deps {
                    self.visit(dep)?;
                }

                self.path.pop();
                self.marks.insert(target.to_string(), VisitState::Done);
                self.order.push(rule);
                Ok(())
            }
        }
    }

    fn cycle_error(&self, target: &str) -> HashmakeError {
        let start = self.path.iter().position(|t| t == target).unwrap_or(0);
        let mut chain: Vec<TargetName> = self.path[start..].to_vec();
        chain.push(target.to_string());

        error!(rule = %target, chain = ?chain, "cycle detected in dependency graph");
        HashmakeError::CycleDetected {
            target: target.to_string(),
            chain,
        }
    }
}
