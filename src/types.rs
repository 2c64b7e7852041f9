use std::str::FromStr;

use serde::Deserialize;

/// Canonical target name type used throughout the crate.
pub type TargetName = String;

/// Storage engine behind the staleness cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// SQLite database (`.hashmake/cache.db`).
    Sqlite,
    /// Flat text file (`.hashmake/digests`).
    File,
    /// In-memory only; every invocation starts cold.
    Memory,
}

impl Default for CacheBackend {
    fn default() -> Self {
        CacheBackend::Sqlite
    }
}

impl CacheBackend {
    /// Default location of the cache, relative to the project root.
    ///
    /// `None` for backends that never touch the disk.
    pub fn default_path(self) -> Option<&'static str> {
        match self {
            CacheBackend::Sqlite => Some(".hashmake/cache.db"),
            CacheBackend::File => Some(".hashmake/digests"),
            CacheBackend::Memory => None,
        }
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(CacheBackend::Sqlite),
            "file" => Ok(CacheBackend::File),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(format!(
                "invalid cache_backend: {other} (expected \"sqlite\", \"file\" or \"memory\")"
            )),
        }
    }
}
