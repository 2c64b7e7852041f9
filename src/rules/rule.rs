// src/rules/rule.rs

use std::fmt;

use crate::types::TargetName;

/// How a rule came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Declared by the build description.
    Explicit,
    /// Synthesized for a name that was referenced but never declared; the
    /// target is expected to be an existing source file.
    Filename,
}

/// The atomic build unit: a target, what it depends on, and how to make it.
///
/// Rules are plain data once declared. Per-run bookkeeping (visit marks,
/// "already rebuilt") lives in side tables owned by the resolver, the cache
/// and the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub target: TargetName,
    /// Direct dependencies in declaration order; duplicates are kept.
    pub deps: Vec<TargetName>,
    pub recipe: Option<String>,
    pub kind: RuleKind,
    /// Out of date on every run.
    pub always_stale: bool,
}

impl Rule {
    pub fn explicit(
        target: impl Into<TargetName>,
        deps: Vec<TargetName>,
        recipe: Option<String>,
    ) -> Self {
        Self {
            target: target.into(),
            deps,
            recipe,
            kind: RuleKind::Explicit,
            always_stale: false,
        }
    }

    pub fn filename(target: impl Into<TargetName>) -> Self {
        Self {
            target: target.into(),
            deps: Vec::new(),
            recipe: None,
            kind: RuleKind::Filename,
            always_stale: false,
        }
    }

    pub fn is_filename(&self) -> bool {
        self.kind == RuleKind::Filename
    }

    pub fn has_recipe(&self) -> bool {
        self.recipe.is_some()
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Explicit => f.write_str("explicit"),
            RuleKind::Filename => f.write_str("filename"),
        }
    }
}

/// `target: dep dep (kind)(recipe)`, the format used by `--dry-run`.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.target)?;
        for dep in &self.deps {
            write!(f, " {dep}")?;
        }
        write!(f, " ({})", self.kind)?;
        if self.has_recipe() {
            f.write_str("(recipe)")?;
        }
        if self.always_stale {
            f.write_str("(always)")?;
        }
        Ok(())
    }
}
