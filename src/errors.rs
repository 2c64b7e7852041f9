// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Every variant is fatal for a build run; nothing here is retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HashmakeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("No rule to make goal '{0}'")]
    UnknownGoal(String),

    #[error("Cycle detected in dependency graph at target '{target}' ({})", .chain.join(" -> "))]
    CycleDetected { target: String, chain: Vec<String> },

    #[error("Unable to find rule for target '{0}' (no such file and no recipe)")]
    MissingSourceFile(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Recipe for target '{target}' failed (exit code {code})")]
    RecipeFailed { target: String, code: i32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HashmakeError {
    /// Target named by the error, if the error is about a single target.
    pub fn target(&self) -> Option<&str> {
        match self {
            HashmakeError::UnknownGoal(t) | HashmakeError::MissingSourceFile(t) => Some(t),
            HashmakeError::CycleDetected { target, .. }
            | HashmakeError::RecipeFailed { target, .. } => Some(target),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HashmakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_names_the_chain() {
        let err = HashmakeError::CycleDetected {
            target: "x".into(),
            chain: vec!["x".into(), "y".into(), "x".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'x'"));
        assert!(msg.contains("x -> y -> x"));
        assert_eq!(err.target(), Some("x"));
    }

    #[test]
    fn config_errors_have_no_target() {
        let err = HashmakeError::ConfigError("bad".into());
        assert_eq!(err.target(), None);
    }
}
