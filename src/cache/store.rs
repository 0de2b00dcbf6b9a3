//! SQLite-backed store for the repository listing snapshot.

use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

use crate::types::RepoDescriptor;

/// Key under which the authenticated user's repository list is stored.
pub const USER_REPOS_KEY: &str = "user_repos";

/// Errors returned by the metadata cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt cache payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Returns the current Unix timestamp in seconds.
fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Durable mapping from a cache key to the last fetched list of descriptors.
///
/// Entries never expire; they are only replaced by an explicit renewal.
pub struct MetadataCache {
    conn: Mutex<Connection>,
    key: String,
}

impl MetadataCache {
    /// Open or create the cache database at the given path, initialising the schema.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let cache = Self {
            conn: Mutex::new(conn),
            key: USER_REPOS_KEY.to_string(),
        };
        cache.init()?;
        Ok(cache)
    }

    /// Initialize the database schema. This is idempotent.
    fn init(&self) -> Result<(), CacheError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                renewed_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// The cached descriptor list, or `None` if nothing was ever stored.
    pub fn get(&self) -> Result<Option<Vec<RepoDescriptor>>, CacheError> {
        let conn = self.conn.lock().unwrap();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM cache_entries WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(CacheError::from))
            .transpose()
    }

    /// Replace the stored list with `repos` in one transaction.
    pub fn put(&self, repos: &[RepoDescriptor]) -> Result<(), CacheError> {
        let payload = serde_json::to_string(repos)?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO cache_entries (key, payload, renewed_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                renewed_at = excluded.renewed_at",
            params![self.key, payload, now_unix()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Unix timestamp of the last successful renewal, if any.
    pub fn renewed_at(&self) -> Result<Option<i64>, CacheError> {
        let conn = self.conn.lock().unwrap();
        let ts = conn
            .query_row(
                "SELECT renewed_at FROM cache_entries WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts)
    }

    /// Whether the listing must be fetched again: forced, or nothing cached yet.
    pub fn should_renew(&self, force: bool) -> Result<bool, CacheError> {
        if force {
            return Ok(true);
        }
        let conn = self.conn.lock().unwrap();
        let present: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM cache_entries WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(present.is_none())
    }
}
