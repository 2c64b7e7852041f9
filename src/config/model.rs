// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::exec::DEFAULT_SHELL;
use crate::rules::RuleStore;
use crate::types::CacheBackend;

/// A build description exactly as read from one TOML file.
///
/// ```toml
/// include = ["common.toml"]
///
/// [config]
/// goal = "app"
/// cache_backend = "sqlite"
///
/// [vars]
/// CC = "cc"
///
/// [[rule]]
/// target = "app"
/// deps = ["main.o"]
/// recipe = "${CC} -o app main.o"
/// ```
///
/// All sections are optional at this level; an empty rule list is rejected
/// only after includes have been merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDescription {
    /// Other description files whose vars and rules come first.
    #[serde(default)]
    pub include: Vec<String>,

    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// `${NAME}` substitutions from `[vars]`.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Rules from `[[rule]]`, in file order.
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,
}

/// `[config]` section.
///
/// Every field is optional so that an including file can override just the
/// settings it names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigSection {
    /// Goal when none is given on the command line. Defaults to the first
    /// declared target.
    #[serde(default)]
    pub goal: Option<String>,

    /// `"sqlite"` (default), `"file"` or `"memory"`.
    #[serde(default)]
    pub cache_backend: Option<CacheBackend>,

    /// Cache location, relative to the project root unless absolute.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Shell used to run recipes.
    #[serde(default)]
    pub shell: Option<String>,
}

impl ConfigSection {
    /// Fill every unset field from `base`.
    pub fn or(self, base: ConfigSection) -> ConfigSection {
        ConfigSection {
            goal: self.goal.or(base.goal),
            cache_backend: self.cache_backend.or(base.cache_backend),
            cache_path: self.cache_path.or(base.cache_path),
            shell: self.shell.or(base.shell),
        }
    }

    pub fn cache_backend(&self) -> CacheBackend {
        self.cache_backend.unwrap_or_default()
    }

    pub fn shell(&self) -> &str {
        self.shell.as_deref().unwrap_or(DEFAULT_SHELL)
    }
}

/// One `[[rule]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleConfig {
    pub target: String,

    /// Dependencies in the order they are listed.
    #[serde(default)]
    pub deps: Vec<String>,

    /// Shell text run to produce the target. A rule without one only
    /// groups its dependencies.
    #[serde(default)]
    pub recipe: Option<String>,

    /// Rebuild on every invocation.
    #[serde(default)]
    pub always: bool,
}

/// A validated build description: includes merged, variables expanded.
///
/// Only [`TryFrom<RawDescription>`](crate::config::validate) builds one.
#[derive(Debug, Clone)]
pub struct Description {
    config: ConfigSection,
    vars: BTreeMap<String, String>,
    rules: Vec<RuleConfig>,
}

impl Description {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        vars: BTreeMap<String, String>,
        rules: Vec<RuleConfig>,
    ) -> Self {
        Self {
            config,
            vars,
            rules,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    /// Final variable values, command-line parameters included.
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn rules(&self) -> &[RuleConfig] {
        &self.rules
    }

    /// Declare every rule into `store`, in order, then apply the `[config]`
    /// goal if there is one.
    pub fn declare_into(&self, store: &mut RuleStore) {
        for rule in &self.rules {
            store.declare(rule.target.clone(), rule.deps.clone(), rule.recipe.clone());
            if rule.always {
                store.set_always_stale(&rule.target, true);
            }
        }
        if let Some(goal) = &self.config.goal {
            store.set_goal(goal.clone());
        }
    }
}
