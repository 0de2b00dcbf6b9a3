//! Local fixtures: bare source repositories to clone from, and a transport
//! that records what it was asked to do.

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::git::{GitError, GitTransport, Libgit2Transport};
use super::progress::ProgressLine;

pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A bare repository on disk standing in for the GitHub remote.
pub struct SourceRepo {
    pub path: PathBuf,
    pub repo: Repository,
}

impl SourceRepo {
    pub fn new(path: PathBuf) -> Self {
        let mut opts = RepositoryInitOptions::new();
        opts.bare(true).initial_head("main");
        let repo = Repository::init_opts(&path, &opts).expect("init source repo");
        Self { path, repo }
    }

    pub fn url(&self) -> String {
        self.path.to_str().expect("utf-8 temp path").to_string()
    }

    fn signature() -> Signature<'static> {
        Signature::now("Mirror Test", "mirror@example.com").expect("signature")
    }

    /// Commit a one-file tree on top of `branch`, creating the branch if needed.
    pub fn commit(&self, branch: &str, message: &str) -> Oid {
        let refname = format!("refs/heads/{}", branch);
        let blob = self.repo.blob(message.as_bytes()).expect("blob");
        let mut builder = self.repo.treebuilder(None).expect("treebuilder");
        builder.insert("README", blob, 0o100644).expect("insert");
        let tree = self
            .repo
            .find_tree(builder.write().expect("write tree"))
            .expect("tree");

        let parent = self
            .repo
            .find_reference(&refname)
            .ok()
            .and_then(|r| r.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let sig = Self::signature();
        self.repo
            .commit(Some(&refname), &sig, &sig, message, &tree, &parents)
            .expect("commit")
    }

    /// Lightweight tag on `target`.
    pub fn tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(target, None).expect("object");
        self.repo
            .tag_lightweight(name, &object, true)
            .expect("tag");
    }

    /// Attach a note (in `refs/notes/commits`) to `target`.
    pub fn note(&self, target: Oid, text: &str) -> Oid {
        let sig = Self::signature();
        self.repo
            .note(&sig, &sig, None, target, text, true)
            .expect("note")
    }
}

/// Delegates to libgit2 and remembers every call.
#[derive(Default)]
pub struct RecordingTransport {
    inner: Libgit2Transport,
    pub clones: RefCell<Vec<(String, PathBuf)>>,
    pub fetches: RefCell<Vec<Vec<String>>>,
}

impl GitTransport for RecordingTransport {
    fn clone_bare(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut ProgressLine<'_>,
    ) -> Result<Repository, GitError> {
        self.clones
            .borrow_mut()
            .push((url.to_string(), dest.to_path_buf()));
        self.inner.clone_bare(url, dest, progress)
    }

    fn fetch(
        &self,
        repo: &Repository,
        refspecs: &[&str],
        progress: &mut ProgressLine<'_>,
    ) -> Result<Vec<String>, GitError> {
        self.fetches
            .borrow_mut()
            .push(refspecs.iter().map(|s| s.to_string()).collect());
        self.inner.fetch(repo, refspecs, progress)
    }
}
