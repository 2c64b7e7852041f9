// src/config/loader.rs

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{Description, RawDescription};
use crate::errors::{HashmakeError, Result};
use crate::fs::FileSystem;

/// Environment variable listing extra directories searched for includes.
pub const INCLUDE_PATH_ENV: &str = "HASHMAKE_INCLUDE_PATH";

/// Load one description file without following its includes.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for a
/// usable [`Description`].
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawDescription> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path).map_err(|e| {
        HashmakeError::ConfigError(format!("cannot read build description: {e:#}"))
    })?;

    let raw: RawDescription = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a description, merge its includes, apply command-line parameters and
/// validate the result.
///
/// - Included files contribute first: their vars are overridden by the
///   including file's, and their rules are declared before its rules.
/// - `params` (`NAME=VALUE` from the command line) override every file.
/// - `[config]` settings of the including file win field by field.
pub fn load_and_validate(
    fs: &dyn FileSystem,
    path: impl AsRef<Path>,
    params: &[(String, String)],
) -> Result<Description> {
    load_and_validate_with(fs, path, params, &include_search_path())
}

/// Like [`load_and_validate`], but includes not found next to the including
/// file are searched in `search_path` instead of [`INCLUDE_PATH_ENV`].
pub fn load_and_validate_with(
    fs: &dyn FileSystem,
    path: impl AsRef<Path>,
    params: &[(String, String)],
    search_path: &[PathBuf],
) -> Result<Description> {
    let mut loader = IncludeLoader {
        fs,
        search_path,
        stack: Vec::new(),
    };

    let mut raw = loader.load(path.as_ref())?;
    for (name, value) in params {
        debug!(var = %name, value = %value, "command-line parameter");
        raw.vars.insert(name.clone(), value.clone());
    }

    Description::try_from(raw)
}

/// Default description file name, looked up in the current directory.
pub fn default_description_path() -> PathBuf {
    PathBuf::from("Hashmakefile.toml")
}

/// Directories from [`INCLUDE_PATH_ENV`], in order.
pub fn include_search_path() -> Vec<PathBuf> {
    env::var_os(INCLUDE_PATH_ENV)
        .map(|v| env::split_paths(&v).collect())
        .unwrap_or_default()
}

struct IncludeLoader<'a> {
    fs: &'a dyn FileSystem,
    search_path: &'a [PathBuf],
    /// Files currently being loaded, outermost first.
    stack: Vec<PathBuf>,
}

impl IncludeLoader<'_> {
    fn load(&mut self, path: &Path) -> Result<RawDescription> {
        let key = self
            .fs
            .canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf());
        if self.stack.contains(&key) {
            let chain: Vec<String> = self
                .stack
                .iter()
                .chain(std::iter::once(&key))
                .map(|p| p.display().to_string())
                .collect();
            return Err(HashmakeError::ConfigError(format!(
                "include cycle: {}",
                chain.join(" -> ")
            )));
        }

        let own = load_from_path(self.fs, path)?;
        if own.include.is_empty() {
            return Ok(own);
        }

        self.stack.push(key);
        let mut merged = RawDescription::default();
        for name in &own.include {
            let found = self.find_include(path, name)?;
            debug!(include = ?found, from = ?path, "loading include");
            let inner = self.load(&found)?;
            merged.config = inner.config.or(merged.config);
            merged.vars.extend(inner.vars);
            merged.rules.extend(inner.rules);
        }
        self.stack.pop();

        merged.config = own.config.or(merged.config);
        merged.vars.extend(own.vars);
        merged.rules.extend(own.rules);
        Ok(merged)
    }

    /// Next to the including file first, then the search path.
    fn find_include(&self, from: &Path, name: &str) -> Result<PathBuf> {
        let name = Path::new(name);
        if name.is_absolute() {
            return if self.fs.is_file(name) {
                Ok(name.to_path_buf())
            } else {
                Err(missing_include(name, from))
            };
        }

        let base = from.parent().unwrap_or_else(|| Path::new(""));
        std::iter::once(base.to_path_buf())
            .chain(self.search_path.iter().cloned())
            .map(|dir| dir.join(name))
            .find(|candidate| self.fs.is_file(candidate))
            .ok_or_else(|| missing_include(name, from))
    }
}

fn missing_include(name: &Path, from: &Path) -> HashmakeError {
    HashmakeError::ConfigError(format!(
        "cannot find include file {:?} (included from {:?})",
        name, from
    ))
}
