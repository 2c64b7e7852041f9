#![allow(dead_code)]

use hashmake::config::{ConfigSection, Description, RawDescription, RuleConfig};
use hashmake::types::CacheBackend;

/// Builder for `Description` to simplify test setup.
pub struct DescriptionBuilder {
    raw: RawDescription,
}

impl DescriptionBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawDescription {
                config: ConfigSection {
                    cache_backend: Some(CacheBackend::Memory),
                    ..ConfigSection::default()
                },
                ..RawDescription::default()
            },
        }
    }

    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.raw.rules.push(rule);
        self
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.raw.vars.insert(name.to_string(), value.to_string());
        self
    }

    pub fn goal(mut self, goal: &str) -> Self {
        self.raw.config.goal = Some(goal.to_string());
        self
    }

    pub fn cache_backend(mut self, backend: CacheBackend) -> Self {
        self.raw.config.cache_backend = Some(backend);
        self
    }

    pub fn shell(mut self, shell: &str) -> Self {
        self.raw.config.shell = Some(shell.to_string());
        self
    }

    pub fn build(self) -> Description {
        Description::try_from(self.raw).expect("Failed to build valid description from builder")
    }
}

impl Default for DescriptionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RuleConfig`.
pub struct RuleBuilder {
    rule: RuleConfig,
}

impl RuleBuilder {
    pub fn new(target: &str) -> Self {
        Self {
            rule: RuleConfig {
                target: target.to_string(),
                deps: vec![],
                recipe: None,
                always: false,
            },
        }
    }

    pub fn dep(mut self, dep: &str) -> Self {
        self.rule.deps.push(dep.to_string());
        self
    }

    pub fn deps(mut self, deps: &[&str]) -> Self {
        self.rule.deps.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn recipe(mut self, recipe: &str) -> Self {
        self.rule.recipe = Some(recipe.to_string());
        self
    }

    pub fn always(mut self, val: bool) -> Self {
        self.rule.always = val;
        self
    }

    pub fn build(self) -> RuleConfig {
        self.rule
    }
}
