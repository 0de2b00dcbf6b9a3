//! Local bare mirrors: resolve (open or clone), hosting metadata, fetch.

mod fetch;
mod git;
mod metadata;
mod progress;
mod resolve;
#[cfg(test)]
pub(crate) mod testutil;

pub use fetch::{FetchResult, fetch};
pub use git::{DEFAULT_REMOTE, GitCli, GitError, GitTransport, Libgit2Transport};
pub use metadata::{keys, sync};
pub use progress::ProgressLine;
pub use resolve::{LocalMirror, resolve};

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ParseError;

/// Failure while mirroring one repository. Never stops the rest of the run.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("invalid repository name {full_name:?}: {source}")]
    InvalidName {
        full_name: String,
        #[source]
        source: ParseError,
    },
    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} exists but is not a git repository", .0.display())]
    NotARepository(PathBuf),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
