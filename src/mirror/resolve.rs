//! Locating or creating the local mirror for one descriptor.

use git2::Repository;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::MirrorError;
use super::git::{GitError, GitTransport, open_repository};
use super::progress::ProgressLine;
use crate::types::{RepoDescriptor, RepoKey};

/// Handle to a bare mirror under the checkout directory.
pub struct LocalMirror {
    pub key: RepoKey,
    pub path: PathBuf,
    pub repo: Repository,
    /// Whether this run created the mirror.
    pub cloned: bool,
}

/// Open the mirror for `descriptor`, cloning it first if it does not exist yet.
///
/// An existing mirror is never recloned. A leftover empty directory from an
/// interrupted clone is cloned into; any other non-repository content at the
/// path is an error rather than something to delete.
pub fn resolve(
    checkout_dir: &Path,
    descriptor: &RepoDescriptor,
    transport: &dyn GitTransport,
    out: &mut dyn Write,
) -> Result<LocalMirror, MirrorError> {
    let key = descriptor
        .key()
        .map_err(|source| MirrorError::InvalidName {
            full_name: descriptor.full_name.clone(),
            source,
        })?;
    let path = key.mirror_path(checkout_dir);

    ensure_parent_dir(&path)?;

    match open_repository(&path) {
        Ok(repo) => {
            if !repo.is_bare() {
                log::warn!("{} is not a bare repository", path.display());
            }
            log::debug!("Using existing mirror at {}", path.display());
            return Ok(LocalMirror {
                key,
                path,
                repo,
                cloned: false,
            });
        }
        Err(GitError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    if !is_missing_or_empty_dir(&path)? {
        return Err(MirrorError::NotARepository(path));
    }

    writeln!(out, "Cloning {}", descriptor.html_url)?;
    let mut progress = ProgressLine::new(out);
    let cloned = transport.clone_bare(&descriptor.clone_url, &path, &mut progress);
    progress.finish()?;
    let repo = cloned?;

    log::info!("Cloned {} into {}", descriptor.full_name, path.display());
    Ok(LocalMirror {
        key,
        path,
        repo,
        cloned: true,
    })
}

/// Create every ancestor of `path`; an existing tree is success.
fn ensure_parent_dir(path: &Path) -> Result<(), MirrorError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|source| MirrorError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })
}

fn is_missing_or_empty_dir(path: &Path) -> std::io::Result<bool> {
    match std::fs::read_dir(path) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}
