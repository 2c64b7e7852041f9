// src/cache/mod.rs

//! Staleness cache.
//!
//! - [`store`] defines the [`HashStore`] backend trait plus the flat-file and
//!   in-memory backends.
//! - [`sqlite`] is the default SQLite backend.
//! - [`staleness`] answers "does this target need rebuilding?" on top of a
//!   backend and remembers what was rebuilt during the current run.
//!
//! Known limitation: nothing locks the cache, so two invocations against the
//! same project at once may interleave their writes.

pub mod sqlite;
pub mod staleness;
pub mod store;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::{HashmakeError, Result};
use crate::types::CacheBackend;

pub use sqlite::SqliteHashStore;
pub use staleness::{BuildId, StalenessCache};
pub use store::{FileHashStore, HashStore, MemoryHashStore};

/// Where `backend` keeps its data: `path` if given, else the backend's
/// default; relative paths are taken from the project `root`. `None` for the
/// memory backend without an explicit path.
pub fn cache_location(backend: CacheBackend, root: &Path, path: Option<&Path>) -> Option<PathBuf> {
    path.map(Path::to_path_buf)
        .or_else(|| backend.default_path().map(PathBuf::from))
        .map(|p| if p.is_absolute() { p } else { root.join(p) })
}

/// Open the configured backend at [`cache_location`].
///
/// Any failure is [`HashmakeError::CacheUnavailable`].
pub fn open_store(
    backend: CacheBackend,
    root: &Path,
    path: Option<&Path>,
) -> Result<Box<dyn HashStore>> {
    let store: Box<dyn HashStore> = match (backend, cache_location(backend, root, path)) {
        (CacheBackend::Memory, _) | (_, None) => Box::new(MemoryHashStore::new()),
        (CacheBackend::Sqlite, Some(p)) => Box::new(
            SqliteHashStore::open(&p).map_err(|e| unavailable(&p, e))?,
        ),
        (CacheBackend::File, Some(p)) => {
            Box::new(FileHashStore::open(&p).map_err(|e| unavailable(&p, e))?)
        }
    };

    info!(?backend, "opened staleness cache");
    Ok(store)
}

/// Open the configured backend for reading only.
///
/// Nothing is created: a cache that does not exist yet reads as empty, and
/// an existing SQLite database is opened read-only.
pub fn open_store_read_only(
    backend: CacheBackend,
    root: &Path,
    path: Option<&Path>,
) -> Result<Box<dyn HashStore>> {
    let store: Box<dyn HashStore> = match (backend, cache_location(backend, root, path)) {
        (CacheBackend::Sqlite, Some(p)) if p.exists() => Box::new(
            SqliteHashStore::open_read_only(&p).map_err(|e| unavailable(&p, e))?,
        ),
        (CacheBackend::File, Some(p)) if p.exists() => {
            Box::new(FileHashStore::open(&p).map_err(|e| unavailable(&p, e))?)
        }
        _ => Box::new(MemoryHashStore::new()),
    };

    info!(?backend, "opened staleness cache read-only");
    Ok(store)
}

fn unavailable(path: &Path, err: anyhow::Error) -> HashmakeError {
    HashmakeError::CacheUnavailable(format!("{}: {err:#}", path.display()))
}
