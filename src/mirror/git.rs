//! Git operations.
//!
//! **libgit2** does everything that touches a mirror: opening it, bare clones
//! and refspec fetches (it exposes transfer progress and per-ref update
//! callbacks), and config writes.
//!
//! **CLI (with hardening)** is only used to read the user's git configuration
//! the same way `git config` resolves it (includes, conditional includes).

use git2::build::RepoBuilder;
use git2::{AutotagOption, Cred, CredentialType, FetchOptions, RemoteCallbacks, Repository};
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

use super::progress::{ProgressLine, format_bytes};

/// Remote every mirror fetches from.
pub const DEFAULT_REMOTE: &str = "origin";

/// Mapping that gives a bare clone every remote branch as a local head, the
/// refs cgit and git-daemon serve.
const CLONE_HEADS_REFSPEC: &str = "+refs/heads/*:refs/heads/*";

/// Username GitHub accepts alongside a token for HTTPS transports.
const TOKEN_USERNAME: &str = "x-access-token";

/// Errors returned by git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// libgit2 reported an error.
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
    /// Repository path does not contain a git repo.
    #[error("repository not found at {0}")]
    NotFound(String),
    /// Clone failed.
    #[error("clone of {url} failed: {source}")]
    CloneError {
        url: String,
        #[source]
        source: git2::Error,
    },
    /// Fetch failed.
    #[error("fetch failed: {0}")]
    FetchError(#[source] git2::Error),
    /// The git binary exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    /// Underlying IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid inputs were provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Validate a config key passed to the git binary.
///
/// Rejects empty keys, keys starting with `-` (could be read as flags) and
/// keys with whitespace or control characters.
fn validate_config_key(key: &str) -> Result<(), GitError> {
    if key.is_empty() {
        return Err(GitError::InvalidInput("config key cannot be empty".into()));
    }
    if key.starts_with('-') {
        return Err(GitError::InvalidInput(
            "config key cannot start with '-'".into(),
        ));
    }
    if key.bytes().any(|b| b <= b' ') {
        return Err(GitError::InvalidInput(
            "config key cannot contain whitespace or control characters".into(),
        ));
    }
    Ok(())
}

/// Git CLI wrapper with security hardening.
pub struct GitCli {
    git_path: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Create a new GitCli instance using the system git.
    pub fn new() -> Self {
        Self {
            git_path: "git".into(),
        }
    }

    /// Create a hardened Command with security settings.
    ///
    /// Applies:
    /// - `GIT_TERMINAL_PROMPT=0` - disable interactive prompts
    /// - `core.hooksPath=` - disable hooks execution
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.args(["-c", "core.hooksPath="]);
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Read one value from the user's git configuration.
    ///
    /// Returns `Ok(None)` when the key is unset (git exits with status 1).
    pub fn config_get(&self, key: &str) -> Result<Option<String>, GitError> {
        self.config_get_in(None, key)
    }

    /// Like [`GitCli::config_get`], resolved from inside `dir` so repository
    /// local configuration applies too.
    pub fn config_get_in(&self, dir: Option<&Path>, key: &str) -> Result<Option<String>, GitError> {
        validate_config_key(key)?;

        let mut cmd = self.command();
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        let output = cmd.args(["config", "--get", key]).output()?;

        if output.status.success() {
            let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
            return Ok(Some(value));
        }
        if output.status.code() == Some(1) {
            return Ok(None);
        }

        Err(GitError::CommandFailed {
            command: format!("config --get {}", key),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Open an existing repository at the given path.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    let repo = Repository::open(path).map_err(|e| {
        if e.code() == git2::ErrorCode::NotFound {
            GitError::NotFound(path.display().to_string())
        } else {
            GitError::Git(e)
        }
    })?;
    Ok(repo)
}

/// The version-control primitives the mirror engine needs from a transport.
pub trait GitTransport {
    /// Clone `url` into `dest` as a bare repository.
    fn clone_bare(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut ProgressLine<'_>,
    ) -> Result<Repository, GitError>;

    /// Force-fetch `refspecs` from the default remote in one operation.
    ///
    /// Returns the full names of local refs that changed, in the order the
    /// transport updated them.
    fn fetch(
        &self,
        repo: &Repository,
        refspecs: &[&str],
        progress: &mut ProgressLine<'_>,
    ) -> Result<Vec<String>, GitError>;
}

/// libgit2-backed transport, authenticating HTTPS with a GitHub token.
#[derive(Default)]
pub struct Libgit2Transport {
    token: Option<String>,
}

impl Libgit2Transport {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    fn remote_callbacks<'a>(&'a self, progress: &'a mut ProgressLine<'_>) -> RemoteCallbacks<'a> {
        let mut callbacks = RemoteCallbacks::new();

        callbacks.transfer_progress(move |stats| {
            progress.update(
                stats.received_objects(),
                stats.total_objects(),
                &format_bytes(stats.received_bytes()),
            );
            true
        });

        if let Some(token) = self.token.as_deref() {
            // libgit2 asks again after a rejected credential; answer only once.
            let mut offered = false;
            callbacks.credentials(move |_url, _username, allowed| {
                if offered || !allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                    return Err(git2::Error::from_str(
                        "authentication failed with the configured GitHub token",
                    ));
                }
                offered = true;
                Cred::userpass_plaintext(TOKEN_USERNAME, token)
            });
        }

        callbacks
    }
}

impl GitTransport for Libgit2Transport {
    fn clone_bare(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut ProgressLine<'_>,
    ) -> Result<Repository, GitError> {
        let clone_error = |source: git2::Error| GitError::CloneError {
            url: url.to_string(),
            source,
        };

        let repo = {
            let mut fetch_options = FetchOptions::new();
            fetch_options.remote_callbacks(self.remote_callbacks(progress));
            RepoBuilder::new()
                .bare(true)
                .fetch_options(fetch_options)
                .clone(url, dest)
                .map_err(clone_error)?
        };

        // libgit2 only creates the default branch locally.
        {
            let mut fetch_options = FetchOptions::new();
            fetch_options.remote_callbacks(self.remote_callbacks(progress));
            fetch_options.download_tags(AutotagOption::None);
            let mut remote = repo.find_remote(DEFAULT_REMOTE)?;
            remote
                .fetch(&[CLONE_HEADS_REFSPEC], Some(&mut fetch_options), None)
                .map_err(clone_error)?;
        }

        Ok(repo)
    }

    fn fetch(
        &self,
        repo: &Repository,
        refspecs: &[&str],
        progress: &mut ProgressLine<'_>,
    ) -> Result<Vec<String>, GitError> {
        let mut remote = repo.find_remote(DEFAULT_REMOTE)?;
        let mut updated = Vec::new();

        {
            let mut callbacks = self.remote_callbacks(progress);
            callbacks.update_tips(|refname, _old, new| {
                if !new.is_zero() {
                    updated.push(refname.to_string());
                }
                true
            });

            let mut fetch_options = FetchOptions::new();
            fetch_options.remote_callbacks(callbacks);
            // Tags come in through the explicit refspec only.
            fetch_options.download_tags(AutotagOption::None);

            remote
                .fetch(refspecs, Some(&mut fetch_options), None)
                .map_err(GitError::FetchError)?;
        }

        Ok(updated)
    }
}
