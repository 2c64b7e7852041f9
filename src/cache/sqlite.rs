// src/cache/sqlite.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use crate::cache::store::HashStore;

const SCHEMA_VERSION: u32 = 1;
const META_KEY_SCHEMA_VERSION: &str = "schema_version";

/// Digest store backed by a SQLite database.
#[derive(Debug)]
pub struct SqliteHashStore {
    path: PathBuf,
    conn: Connection,
}

impl SqliteHashStore {
    /// Open (creating if needed) the database at `path` and check its schema.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating cache directory at {:?}", parent))?;
            }
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("failed to open cache database at {}", path.display()))?;
        let store = Self { path, conn };
        store.init_schema()?;
        store.enforce_schema_version()?;

        debug!(path = ?store.path, "opened sqlite cache");
        Ok(store)
    }

    /// Open an existing database without creating or migrating anything.
    /// Every [`HashStore::save`] on the result fails.
    pub fn open_read_only(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open cache database at {}", path.display()))?;
        let store = Self { path, conn };
        store.enforce_schema_version()?;

        debug!(path = ?store.path, "opened sqlite cache read-only");
        Ok(store)
    }

    /// Open a private in-memory database (tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory cache")?;
        let store = Self {
            path: PathBuf::from(":memory:"),
            conn,
        };
        store.init_schema()?;
        store.enforce_schema_version()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS meta (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS cache (
                    build_id TEXT NOT NULL,
                    target TEXT NOT NULL,
                    digest TEXT NOT NULL,
                    PRIMARY KEY(build_id, target)
                );
                "#,
            )
            .context("failed to initialize cache schema")?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
                params![META_KEY_SCHEMA_VERSION, SCHEMA_VERSION.to_string()],
            )
            .context("failed to record cache schema version")?;
        Ok(())
    }

    fn enforce_schema_version(&self) -> Result<()> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![META_KEY_SCHEMA_VERSION],
                |row| row.get(0),
            )
            .optional()?;

        match found {
            Some(v) if v == SCHEMA_VERSION.to_string() => Ok(()),
            Some(v) => Err(anyhow!(
                "incompatible cache schema version {v} (expected {SCHEMA_VERSION})"
            )),
            None => Err(anyhow!("cache database has no schema version")),
        }
    }
}

impl HashStore for SqliteHashStore {
    fn load(&self, build_id: &str, target: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT digest FROM cache WHERE build_id = ?1 AND target = ?2",
                params![build_id, target],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("looking up cached digest for '{target}'"))
    }

    fn save(&mut self, build_id: &str, target: &str, digest: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO cache(build_id, target, digest) VALUES (?1, ?2, ?3)",
                params![build_id, target, digest],
            )
            .with_context(|| format!("storing digest for '{target}'"))?;
        info!(rule = %target, digest = %digest, "stored target digest (sqlite)");
        Ok(())
    }
}
