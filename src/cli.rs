// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_description_path;
use crate::errors::{HashmakeError, Result};

/// Command-line arguments for `hashmake`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hashmake",
    version,
    about = "Rebuild targets whose inputs changed, judged by content digests.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the build description (TOML).
    #[arg(
        short = 'f',
        long = "file",
        value_name = "PATH",
        default_value_os_t = default_description_path()
    )]
    pub file: PathBuf,

    /// Rebuild every target in the goal's closure, stale or not.
    #[arg(short = 'B', long)]
    pub force: bool,

    /// Do not print a `Making target X:` line before each recipe.
    #[arg(short = 's', long)]
    pub silent: bool,

    /// Resolve and print the build order with each rule's staleness, but
    /// run nothing and write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HASHMAKE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Goal to build, plus any `NAME=VALUE` parameters.
    ///
    /// Anything containing `=` is a parameter; the remaining word, if any,
    /// is the goal.
    #[arg(value_name = "GOAL | NAME=VALUE")]
    pub args: Vec<String>,
}

impl CliArgs {
    /// Split the positional words into the goal and the parameters.
    pub fn goal_and_params(&self) -> Result<(Option<String>, Vec<(String, String)>)> {
        let mut goal: Option<String> = None;
        let mut params = Vec::new();

        for word in &self.args {
            match word.split_once('=') {
                Some((name, value)) => {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(HashmakeError::ConfigError(format!(
                            "parameter '{word}' has no name"
                        )));
                    }
                    params.push((name.to_string(), value.to_string()));
                }
                None => {
                    if let Some(first) = &goal {
                        return Err(HashmakeError::ConfigError(format!(
                            "only one goal may be given (got '{first}' and '{word}')"
                        )));
                    }
                    goal = Some(word.clone());
                }
            }
        }

        Ok((goal, params))
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
