//! Hosting metadata for cgit and git-daemon.
//!
//! Everything written here is derived from the descriptor alone, so applying
//! it again with the same descriptor leaves the mirror unchanged.

use git2::{Config, ConfigLevel, Repository};
use std::fs;
use std::path::Path;

use super::git::GitError;
use super::resolve::LocalMirror;
use crate::types::RepoDescriptor;

/// Marker file that lets `git daemon` export the repository.
pub const DAEMON_EXPORT_FILE: &str = "git-daemon-export-ok";
/// Description file read by gitweb/cgit.
pub const DESCRIPTION_FILE: &str = "description";

/// Keys of the `cgit` config section.
pub mod keys {
    pub const DEFAULT_BRANCH: &str = "cgit.defbranch";
    pub const DESCRIPTION: &str = "cgit.desc";
    pub const NAME: &str = "cgit.name";
    pub const OWNER: &str = "cgit.owner";
    pub const CLONE_URL: &str = "cgit.clone-url";
    pub const HOMEPAGE: &str = "cgit.homepage";
    pub const HTML_SERVING: &str = "cgit.enable-html-serving";

    pub const ALL: [&str; 7] = [
        DEFAULT_BRANCH,
        DESCRIPTION,
        NAME,
        OWNER,
        CLONE_URL,
        HOMEPAGE,
        HTML_SERVING,
    ];
}

/// Writer for the repository-local config file.
///
/// libgit2 takes `config.lock` inside each write and drops it before the
/// write returns, so a failed `set` never leaves the file locked.
pub struct ConfigSession {
    config: Config,
}

impl ConfigSession {
    pub fn open(repo: &Repository) -> Result<Self, GitError> {
        let config = repo.config()?.open_level(ConfigLevel::Local)?;
        Ok(Self { config })
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), GitError> {
        self.config.set_str(key, value)?;
        Ok(())
    }

    /// Remove `key`; an already absent key is fine.
    pub fn remove(&mut self, key: &str) -> Result<(), GitError> {
        match self.config.remove(key) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Bring the mirror's hosting metadata in line with `descriptor`.
pub fn sync(mirror: &LocalMirror, descriptor: &RepoDescriptor) -> Result<(), GitError> {
    let git_dir = mirror.repo.path();

    set_daemon_export(git_dir)?;
    set_description(git_dir, descriptor.description_or_empty())?;

    let mut session = ConfigSession::open(&mirror.repo)?;
    session.set(keys::DEFAULT_BRANCH, &descriptor.default_branch)?;
    session.set(keys::DESCRIPTION, descriptor.description_or_empty())?;
    session.set(keys::NAME, &descriptor.name)?;
    session.set(keys::OWNER, &descriptor.owner.login)?;
    session.set(keys::CLONE_URL, &descriptor.clone_urls())?;

    match descriptor.homepage() {
        Some(homepage) => session.set(keys::HOMEPAGE, homepage)?,
        None => session.remove(keys::HOMEPAGE)?,
    }

    if descriptor.serves_pages() {
        session.set(keys::HTML_SERVING, "true")?;
    } else {
        session.remove(keys::HTML_SERVING)?;
    }

    log::debug!("Synced hosting metadata for {}", mirror.key);
    Ok(())
}

fn set_daemon_export(git_dir: &Path) -> Result<(), GitError> {
    let marker = git_dir.join(DAEMON_EXPORT_FILE);
    if !marker.exists() {
        fs::File::create(&marker)?;
    }
    Ok(())
}

fn set_description(git_dir: &Path, description: &str) -> Result<(), GitError> {
    let path = git_dir.join(DESCRIPTION_FILE);
    let contents = format!("{}\n", description);
    if fs::read_to_string(&path).ok().as_deref() != Some(contents.as_str()) {
        fs::write(&path, contents)?;
    }
    Ok(())
}
