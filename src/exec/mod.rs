// src/exec/mod.rs

//! Recipe execution layer.
//!
//! The build driver never runs processes itself; it hands a [`RecipeJob`]
//! to a [`RecipeExecutor`].
//!
//! - [`backend`] defines the trait, the job description and the production
//!   [`ShellExecutor`]. Tests swap in a recording fake.
//! - [`task_runner`] runs one recipe through the shell with
//!   `tokio::process` and forwards its output.

pub mod backend;
pub mod task_runner;

pub use backend::{RecipeExecutor, RecipeJob, ShellExecutor, DEFAULT_SHELL};
