// src/config/validate.rs

use std::collections::BTreeMap;

use anyhow::Context;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::config::model::{Description, RawDescription, RuleConfig};
use crate::errors::{HashmakeError, Result};

/// `${NAME}` with a shell-style identifier.
const VAR_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}";

impl TryFrom<RawDescription> for Description {
    type Error = HashmakeError;

    /// Expects includes to be merged already; `raw.vars` holds the final
    /// values (command-line parameters included).
    fn try_from(raw: RawDescription) -> std::result::Result<Self, Self::Error> {
        ensure_has_rules(&raw)?;

        let expander = VarExpander::new(&raw.vars)?;
        let rules: Vec<RuleConfig> = raw
            .rules
            .into_iter()
            .map(|rule| expander.expand_rule(rule))
            .collect();

        validate_names(&rules)?;
        lint_cycles(&rules);

        Ok(Description::new_unchecked(raw.config, raw.vars, rules))
    }
}

fn ensure_has_rules(raw: &RawDescription) -> Result<()> {
    if raw.rules.is_empty() {
        return Err(HashmakeError::ConfigError(
            "build description must contain at least one [[rule]]".to_string(),
        ));
    }
    Ok(())
}

fn validate_names(rules: &[RuleConfig]) -> Result<()> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.target.trim().is_empty() {
            return Err(HashmakeError::ConfigError(format!(
                "rule #{} has an empty target",
                index + 1
            )));
        }
        if rule.deps.iter().any(|d| d.trim().is_empty()) {
            return Err(HashmakeError::ConfigError(format!(
                "rule '{}' has an empty dependency name",
                rule.target
            )));
        }
    }
    Ok(())
}

/// Warn about cycles anywhere in the declared rules.
///
/// Not an error: a cycle only matters if the chosen goal reaches it, and
/// the resolver reports that case precisely.
pub fn lint_cycles(rules: &[RuleConfig]) {
    // Edge direction: dep -> target.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for rule in rules {
        graph.add_node(rule.target.as_str());
        for dep in &rule.deps {
            graph.add_edge(dep.as_str(), rule.target.as_str(), ());
        }
    }

    if let Err(cycle) = toposort(&graph, None) {
        warn!(
            rule = %cycle.node_id(),
            "build description contains a dependency cycle"
        );
    }
}

/// Expands `${NAME}` references. Unknown names are left as written so the
/// recipe shell can still see them.
pub struct VarExpander<'v> {
    pattern: Regex,
    vars: &'v BTreeMap<String, String>,
}

impl<'v> VarExpander<'v> {
    pub fn new(vars: &'v BTreeMap<String, String>) -> Result<Self> {
        let pattern = Regex::new(VAR_PATTERN).context("compiling variable pattern")?;
        Ok(Self { pattern, vars })
    }

    /// Single pass; substituted values are not expanded again.
    pub fn expand(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| match self.vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => {
                    debug!(var = %&caps[1], "unknown variable left unexpanded");
                    caps[0].to_string()
                }
            })
            .into_owned()
    }

    fn expand_rule(&self, rule: RuleConfig) -> RuleConfig {
        RuleConfig {
            target: self.expand(&rule.target),
            deps: rule.deps.iter().map(|d| self.expand(d)).collect(),
            recipe: rule.recipe.as_deref().map(|r| self.expand(r)),
            always: rule.always,
        }
    }
}
