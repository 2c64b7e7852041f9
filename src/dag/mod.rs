// src/dag/mod.rs

//! Dependency graph resolution.
//!
//! - [`resolver`] walks the rules reachable from a goal depth-first and
//!   produces a topological order, failing on cycles.
//! - [`build_order`] holds the resulting [`BuildOrder`].

pub mod build_order;
pub mod resolver;

pub use build_order::BuildOrder;
pub use resolver::{resolve, VisitState};
