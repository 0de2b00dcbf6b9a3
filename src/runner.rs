//! Drives one mirroring run over the cached repository catalog.

use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::auth::AuthError;
use crate::cache::{CacheError, MetadataCache};
use crate::github::{ListError, RepoLister, fetch_catalog};
use crate::mirror::{self, FetchResult, GitTransport, MirrorError};
use crate::types::RepoDescriptor;

/// Errors that end the whole run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("renewing repository cache failed: {0}")]
    List(#[from] ListError),
    #[error("another gh-mirror run holds {}", .0.display())]
    Busy(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Refresh the cached catalog if forced or empty.
///
/// The cache is only written after a complete sweep; a failed sweep leaves
/// the previous snapshot in place. Returns whether a renewal happened.
pub fn renew_if_due(
    cache: &MetadataCache,
    lister: &dyn RepoLister,
    force: bool,
) -> Result<bool, RunError> {
    if !cache.should_renew(force)? {
        if let Some(ts) = cache.renewed_at()? {
            log::debug!("Repository cache renewed at unix time {}, not renewing", ts);
        }
        return Ok(false);
    }

    log::info!("Renewing GitHub user repository cache...");
    let repos = fetch_catalog(lister)?;
    cache.put(&repos)?;
    Ok(true)
}

/// Repositories whose `full_name` starts with `prefix`, in catalog order.
pub fn filter_by_prefix<'r>(
    repos: &'r [RepoDescriptor],
    prefix: &'r str,
) -> impl Iterator<Item = &'r RepoDescriptor> + 'r {
    repos
        .iter()
        .filter(move |repo| repo.full_name.starts_with(prefix))
}

/// Outcome of a run over the catalog.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub cloned: usize,
    pub failed: Vec<(String, MirrorError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Mirrors repositories one after another into `checkout_dir`.
pub struct Runner<'a> {
    checkout_dir: PathBuf,
    fetch: bool,
    transport: &'a dyn GitTransport,
}

impl<'a> Runner<'a> {
    pub fn new(
        checkout_dir: impl Into<PathBuf>,
        fetch: bool,
        transport: &'a dyn GitTransport,
    ) -> Self {
        Self {
            checkout_dir: checkout_dir.into(),
            fetch,
            transport,
        }
    }

    /// Mirror every repository matching `prefix`, continuing past failures.
    pub fn run(&self, repos: &[RepoDescriptor], prefix: &str, out: &mut dyn Write) -> RunSummary {
        let mut summary = RunSummary::default();

        for repo in filter_by_prefix(repos, prefix) {
            summary.processed += 1;
            match self.mirror_one(repo, out) {
                Ok(cloned) => summary.cloned += usize::from(cloned),
                Err(e) => {
                    log::error!("{}: {}", repo.full_name, e);
                    summary.failed.push((repo.full_name.clone(), e));
                }
            }
        }

        log::info!(
            "Processed {} repositories ({} cloned, {} failed)",
            summary.processed,
            summary.cloned,
            summary.failed.len()
        );
        summary
    }

    /// Resolve, sync and optionally fetch one repository. Returns whether it was cloned.
    pub fn mirror_one(
        &self,
        repo: &RepoDescriptor,
        out: &mut dyn Write,
    ) -> Result<bool, MirrorError> {
        writeln!(out, "{}", repo.full_name)?;

        let local = mirror::resolve(&self.checkout_dir, repo, self.transport, out)?;
        mirror::sync(&local, repo)?;

        if self.fetch {
            let results = mirror::fetch(&local, self.transport, out)?;
            print_fetch_results(&results, out)?;
        }

        Ok(local.cloned)
    }
}

fn print_fetch_results(results: &[FetchResult], out: &mut dyn Write) -> std::io::Result<()> {
    for result in results {
        writeln!(out, "{}", result)?;
    }
    Ok(())
}
