// src/fs/mod.rs

//! File system probe.
//!
//! Everything that touches source files (digesting, existence checks,
//! reading build descriptions) goes through [`FileSystem`] so tests can run
//! against [`mock::MockFileSystem`] instead of the real disk.

use std::fmt::Debug;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path).with_context(|| format!("opening file {:?}", path))?;
        Ok(Box::new(file))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }
}

/// The project root plus the file system it lives on.
///
/// Filename rules name files relative to the root; this type does the
/// joining so callers can pass target names around unchanged.
#[derive(Debug, Clone)]
pub struct SourceTree {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
}

impl SourceTree {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Path of a target on disk.
    pub fn path_of(&self, target: &str) -> PathBuf {
        self.root.join(target)
    }

    /// Whether a target exists as a file under the root.
    pub fn file_exists(&self, target: &str) -> bool {
        self.fs.is_file(&self.path_of(target))
    }

    pub fn open_read(&self, target: &str) -> Result<Box<dyn Read + Send>> {
        self.fs.open_read(&self.path_of(target))
    }
}

/// Figure out the project root for a build description.
///
/// - If the description path has a non-empty parent (e.g.
///   "sub/Hashmakefile.toml"), that directory is the root.
/// - A bare filename like "Hashmakefile.toml" (parent = "") falls back to
///   the current working directory.
pub fn project_root(description_path: &Path) -> PathBuf {
    match description_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
