// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory file system for tests.
///
/// Paths are normalised by dropping `.` components, so `./a.txt` and
/// `a.txt` name the same file. Clones share the same underlying files,
/// which lets a test keep a handle and mutate files between build runs.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a file.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut files = self.files.lock().unwrap();
        files.insert(normalize(path.as_ref()), content.into());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        files.remove(&normalize(path.as_ref()));
    }

    fn contents(&self, path: &Path) -> Result<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let content = self.contents(path)?;
        String::from_utf8(content).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.contents(path)?)))
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        let wanted = normalize(path);
        files.keys().any(|p| p.starts_with(&wanted))
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(&normalize(path))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // No symlinks or cwd in the mock; normalising is all there is.
        Ok(normalize(path))
    }
}
