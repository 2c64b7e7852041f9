// src/cache/store.rs

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Durable storage for target digests, keyed by (build id, target).
///
/// `save` is insert-or-replace. Entries are never deleted; rows for targets
/// that no longer exist are harmless.
pub trait HashStore: Send {
    fn load(&self, build_id: &str, target: &str) -> Result<Option<String>>;
    fn save(&mut self, build_id: &str, target: &str, digest: &str) -> Result<()>;
}

type Key = (String, String);

/// Stores digests in memory only.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<Key, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, build_id: &str, target: &str) -> Result<Option<String>> {
        Ok(self
            .map
            .get(&(build_id.to_string(), target.to_string()))
            .cloned())
    }

    fn save(&mut self, build_id: &str, target: &str, digest: &str) -> Result<()> {
        self.map
            .insert((build_id.to_string(), target.to_string()), digest.to_string());
        debug!(rule = %target, digest = %digest, "stored target digest (memory)");
        Ok(())
    }
}

/// Stores digests in a flat text file, one `build_id<TAB>target<TAB>digest`
/// line per entry. The whole file is rewritten on every save.
#[derive(Debug)]
pub struct FileHashStore {
    path: PathBuf,
    map: HashMap<Key, String>,
}

impl FileHashStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let map = load_all_digests(&path)?;
        debug!(path = ?path, entries = map.len(), "loaded digest file");
        Ok(Self { path, map })
    }
}

impl HashStore for FileHashStore {
    fn load(&self, build_id: &str, target: &str) -> Result<Option<String>> {
        Ok(self
            .map
            .get(&(build_id.to_string(), target.to_string()))
            .cloned())
    }

    fn save(&mut self, build_id: &str, target: &str, digest: &str) -> Result<()> {
        self.map
            .insert((build_id.to_string(), target.to_string()), digest.to_string());
        save_all_digests(&self.path, &self.map)?;
        info!(rule = %target, digest = %digest, "stored target digest (file)");
        Ok(())
    }
}

fn load_all_digests(path: &Path) -> Result<HashMap<Key, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let file = File::open(path).with_context(|| format!("opening digest file at {:?}", path))?;
    let reader = BufReader::new(file);

    let mut map = HashMap::new();
    for line_res in reader.lines() {
        let line = line_res?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(build_id), Some(target), Some(digest)) => {
                map.insert(
                    (build_id.to_string(), target.to_string()),
                    digest.trim().to_string(),
                );
            }
            _ => warn!(path = ?path, line = %line, "skipping malformed digest line"),
        }
    }

    Ok(map)
}

fn save_all_digests(path: &Path, map: &HashMap<Key, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating digest directory at {:?}", parent))?;
    }

    let file = File::create(path).with_context(|| format!("creating digest file at {:?}", path))?;
    let mut writer = BufWriter::new(file);

    // Sorted so the file diffs cleanly between runs.
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort();
    for ((build_id, target), digest) in entries {
        writeln!(writer, "{build_id}\t{target}\t{digest}")?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_is_keyed_by_build_and_target() {
        let mut store = MemoryHashStore::new();
        store.save("one", "a", "d1").unwrap();
        store.save("two", "a", "d2").unwrap();

        assert_eq!(store.load("one", "a").unwrap().as_deref(), Some("d1"));
        assert_eq!(store.load("two", "a").unwrap().as_deref(), Some("d2"));
        assert_eq!(store.load("one", "b").unwrap(), None);
    }

    #[test]
    fn second_save_replaces_the_first() {
        let mut store = MemoryHashStore::new();
        store.save("id", "a", "old").unwrap();
        store.save("id", "a", "new").unwrap();
        assert_eq!(store.load("id", "a").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".hashmake/digests");

        {
            let mut store = FileHashStore::open(&path).unwrap();
            store.save("/p/Hashmakefile.toml", "out file.o", "abc").unwrap();
            store.save("/p/Hashmakefile.toml", "b", "def").unwrap();
        }

        let store = FileHashStore::open(&path).unwrap();
        assert_eq!(
            store.load("/p/Hashmakefile.toml", "out file.o").unwrap().as_deref(),
            Some("abc")
        );
        assert_eq!(store.load("/p/Hashmakefile.toml", "b").unwrap().as_deref(), Some("def"));
    }

    #[test]
    fn file_store_skips_malformed_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("digests");
        fs::write(&path, "garbage\nid\tt\tcafe\n\n").unwrap();

        let store = FileHashStore::open(&path).unwrap();
        assert_eq!(store.load("id", "t").unwrap().as_deref(), Some("cafe"));
    }
}
