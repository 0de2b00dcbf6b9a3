//! Persistent repository listing cache

mod lock;
mod paths;
mod store;

pub use lock::RunLock;
pub use paths::CachePaths;
pub use store::{CacheError, MetadataCache, USER_REPOS_KEY};
