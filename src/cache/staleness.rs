// src/cache/staleness.rs

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cache::store::HashStore;
use crate::digest::{fingerprint, fingerprint_file, Digest};
use crate::fs::SourceTree;
use crate::rules::{Rule, RuleKind, RuleStore};
use crate::types::TargetName;

/// Identity of a build description; the first half of every cache key.
///
/// Normally the canonical path of the description file, so two projects
/// sharing a cache never see each other's digests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildId(String);

impl BuildId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides whether targets are out of date and records fresh digests.
///
/// Every uncertainty (no rule, no cache entry, unreadable file, backend
/// error) resolves to "stale": an extra rebuild is cheaper than a wrong
/// skip.
pub struct StalenessCache {
    build_id: BuildId,
    store: Box<dyn HashStore>,
    sources: SourceTree,
    /// Targets rebuilt (or refreshed) during this run.
    rebuilt: HashSet<TargetName>,
    /// Targets found up to date since the last recorded rebuild.
    fresh: RefCell<HashSet<TargetName>>,
}

impl StalenessCache {
    pub fn new(build_id: BuildId, store: Box<dyn HashStore>, sources: SourceTree) -> Self {
        Self {
            build_id,
            store,
            sources,
            rebuilt: HashSet::new(),
            fresh: RefCell::default(),
        }
    }

    pub fn build_id(&self) -> &BuildId {
        &self.build_id
    }

    /// Whether `target` must be rebuilt.
    ///
    /// Staleness propagates: if anything in the target's transitive
    /// dependency closure is stale or was rebuilt this run, so is the target,
    /// even when its own digest is unchanged.
    ///
    /// "Up to date" answers are remembered until the next
    /// [`record_rebuilt`](Self::record_rebuilt), so walking a build order
    /// digests each file once.
    pub fn is_stale(&self, rules: &RuleStore, target: &str) -> bool {
        let mut memo = HashMap::new();
        let mut visiting = HashSet::new();
        self.is_stale_inner(rules, target, &mut memo, &mut visiting)
    }

    fn is_stale_inner(
        &self,
        rules: &RuleStore,
        target: &str,
        memo: &mut HashMap<TargetName, bool>,
        visiting: &mut HashSet<TargetName>,
    ) -> bool {
        if self.was_rebuilt_this_run(target) {
            return false;
        }
        if self.fresh.borrow().contains(target) {
            return false;
        }
        if let Some(&known) = memo.get(target) {
            return known;
        }
        // A cycle edge adds nothing; the resolver rejects cycles anyway.
        if !visiting.insert(target.to_string()) {
            return false;
        }

        let stale = self.decide(rules, target, memo, visiting);

        visiting.remove(target);
        memo.insert(target.to_string(), stale);
        if !stale {
            self.fresh.borrow_mut().insert(target.to_string());
        }
        stale
    }

    fn decide(
        &self,
        rules: &RuleStore,
        target: &str,
        memo: &mut HashMap<TargetName, bool>,
        visiting: &mut HashSet<TargetName>,
    ) -> bool {
        let Some(rule) = rules.find(target) else {
            debug!(rule = %target, "no rule; assuming stale");
            return true;
        };

        if rule.always_stale {
            debug!(rule = %target, "rule is always out of date");
            return true;
        }

        for dep in &rule.deps {
            if self.was_rebuilt_this_run(dep) {
                debug!(rule = %target, dep = %dep, "dependency rebuilt this run");
                return true;
            }
            if self.is_stale_inner(rules, dep, memo, visiting) {
                debug!(rule = %target, dep = %dep, "dependency is stale");
                return true;
            }
        }

        let current = match self.effective_digest(&rule) {
            Ok(d) => d.to_hex(),
            Err(e) => {
                warn!(rule = %target, error = %e, "cannot digest target; assuming stale");
                return true;
            }
        };

        match self.store.load(self.build_id.as_str(), target) {
            Ok(Some(stored)) if stored == current => {
                debug!(rule = %target, "digest unchanged");
                false
            }
            Ok(Some(_)) => {
                debug!(rule = %target, "digest changed");
                true
            }
            Ok(None) => {
                debug!(rule = %target, "no cache entry");
                true
            }
            Err(e) => {
                warn!(rule = %target, error = %e, "cache lookup failed; assuming stale");
                true
            }
        }
    }

    /// Record that `target` was just rebuilt: remember it for this run and
    /// store its current digest.
    ///
    /// A failing backend write is only logged; the next invocation will
    /// simply rebuild the target again.
    pub fn record_rebuilt(&mut self, rules: &RuleStore, target: &str) -> Result<Option<Digest>> {
        self.rebuilt.insert(target.to_string());
        self.fresh.get_mut().clear();

        let Some(rule) = rules.find(target) else {
            warn!(rule = %target, "no rule; cannot update cache");
            return Ok(None);
        };

        let digest = self.effective_digest(&rule)?;
        match self
            .store
            .save(self.build_id.as_str(), target, &digest.to_hex())
        {
            Ok(()) => info!(rule = %target, digest = %digest, "recorded rebuild"),
            Err(e) => {
                warn!(rule = %target, error = %e, "unable to update cache")
            }
        }
        Ok(Some(digest))
    }

    pub fn was_rebuilt_this_run(&self, target: &str) -> bool {
        self.rebuilt.contains(target)
    }

    /// Targets recorded as rebuilt during this run.
    pub fn rebuilt_this_run(&self) -> impl Iterator<Item = &str> {
        self.rebuilt.iter().map(|s| s.as_str())
    }

    /// Recipe text for explicit rules (empty when there is none), file
    /// contents for filename rules.
    pub fn effective_digest(&self, rule: &Rule) -> Result<Digest> {
        match rule.kind {
            RuleKind::Explicit => Ok(fingerprint(rule.recipe.as_deref().unwrap_or(""))),
            RuleKind::Filename => fingerprint_file(
                self.sources.fs().as_ref(),
                &self.sources.path_of(&rule.target),
            ),
        }
    }
}
