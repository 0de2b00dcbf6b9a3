//! Cache directory path management
//!
//! ```text
//! ~/.cache/gh-mirror/
//! ├── cache.db      # SQLite: repository listing snapshots
//! └── run.lock      # flock held by the running invocation
//! ```

use std::path::{Path, PathBuf};

/// Manages the filesystem paths under the cache directory
#[derive(Debug, Clone)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    /// Creates a new CachePaths with the specified root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the database path: `{root}/cache.db`
    pub fn db_path(&self) -> PathBuf {
        self.root.join("cache.db")
    }

    /// Returns the run lock path: `{root}/run.lock`
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("run.lock")
    }
}

impl Default for CachePaths {
    /// Creates a CachePaths using the system cache directory + "gh-mirror"
    ///
    /// Uses `dirs::cache_dir()` which resolves to:
    /// - Linux: `~/.cache`
    /// - macOS: `~/Library/Caches`
    /// - Windows: `C:\Users\<user>\AppData\Local`
    fn default() -> Self {
        let cache_dir = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        Self::new(cache_dir.join("gh-mirror"))
    }
}
