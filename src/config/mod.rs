// src/config/mod.rs

//! Build description loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a description and its includes from disk (`loader.rs`).
//! - Expand `${NAME}` variables and validate the rules (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    default_description_path, load_and_validate, load_and_validate_with, load_from_path,
};
pub use model::{ConfigSection, Description, RawDescription, RuleConfig};
pub use validate::{lint_cycles, VarExpander};
