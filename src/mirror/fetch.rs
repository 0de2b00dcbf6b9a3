//! Incremental force-fetch of heads, tags and notes into a mirror.

use git2::{ObjectType, Oid};
use std::fmt;
use std::io::Write;

use super::MirrorError;
use super::git::{GitError, GitTransport};
use super::progress::ProgressLine;
use super::resolve::LocalMirror;

/// Exactly what every fetch asks the remote for, in one network operation.
pub const FETCH_REFSPECS: [&str; 3] = [
    "+refs/heads/*:refs/remotes/origin/*",
    "+refs/tags/*:refs/tags/*",
    "+refs/notes/*:refs/notes/*",
];

/// One ref the fetch moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Short name, e.g. `origin/main` or `v1.0`.
    pub name: String,
    /// Full ref name, e.g. `refs/remotes/origin/main`.
    pub path: String,
    /// Commit the ref resolves to after the fetch.
    pub commit: Oid,
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t{:>20}\t-> {:36}\t{}", self.name, self.path, self.commit)
    }
}

/// Force-fetch [`FETCH_REFSPECS`] from origin and describe every ref that changed.
pub fn fetch(
    mirror: &LocalMirror,
    transport: &dyn GitTransport,
    out: &mut dyn Write,
) -> Result<Vec<FetchResult>, MirrorError> {
    let mut progress = ProgressLine::new(out);
    let updated = transport.fetch(&mirror.repo, &FETCH_REFSPECS, &mut progress);
    progress.finish()?;
    let updated = updated?;

    log::debug!("{}: {} refs updated", mirror.key, updated.len());

    updated
        .iter()
        .map(|path| describe_ref(mirror, path).map_err(MirrorError::from))
        .collect()
}

fn describe_ref(mirror: &LocalMirror, path: &str) -> Result<FetchResult, GitError> {
    let reference = mirror.repo.find_reference(path)?;
    let name = reference.shorthand().unwrap_or(path).to_string();
    let commit = match reference.peel(ObjectType::Commit) {
        Ok(object) => object.id(),
        // Tags may point at trees or blobs; report the object itself.
        Err(_) => reference.peel(ObjectType::Any)?.id(),
    };
    Ok(FetchResult {
        name,
        path: path.to_string(),
        commit,
    })
}
