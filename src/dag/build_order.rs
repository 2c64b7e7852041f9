// src/dag/build_order.rs

use std::sync::Arc;

use crate::rules::Rule;

/// Dependency-respecting linearization of the goal's transitive closure.
///
/// For every rule at index `i`, each of its dependencies sits at an index
/// `< i`. The goal itself is always last.
#[derive(Debug, Clone, Default)]
pub struct BuildOrder {
    rules: Vec<Arc<Rule>>,
}

impl BuildOrder {
    pub(crate) fn from_post_order(rules: Vec<Arc<Rule>>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter()
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.target.as_str())
    }

    pub fn position(&self, target: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.target == target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.position(target).is_some()
    }

    pub fn goal(&self) -> Option<&Arc<Rule>> {
        self.rules.last()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a BuildOrder {
    type Item = &'a Arc<Rule>;
    type IntoIter = std::slice::Iter<'a, Arc<Rule>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
