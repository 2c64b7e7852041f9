// src/rules/mod.rs

//! Rule storage.
//!
//! - [`rule`] defines the [`Rule`] value and its [`RuleKind`].
//! - [`store`] holds the per-invocation [`RuleStore`]: one rule per target
//!   name, redeclaration overwrites, and filename rules are synthesized for
//!   names that are only ever referenced as dependencies.

pub mod rule;
pub mod store;

pub use rule::{Rule, RuleKind};
pub use store::RuleStore;
