//! Remote repository listing.
//!
//! `RepoLister` is the paging contract the cache renewal depends on;
//! `fetch_catalog` turns it into one complete, ordered snapshot.

mod client;

pub use client::{DEFAULT_API_URL, GithubClient};

use thiserror::Error;

use crate::types::RepoDescriptor;

/// The only status a listing page is accepted with.
const STATUS_OK: u16 = 200;

/// Errors from listing the remote catalog. All of them abort a renewal.
#[derive(Error, Debug)]
pub enum ListError {
    /// The API answered with a non-success status.
    #[error("listing failed with HTTP {status}: {payload}")]
    Status { status: u16, payload: String },
    /// The request never got an HTTP answer.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to read response: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed listing payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// One page of the remote catalog.
#[derive(Debug, Clone)]
pub struct ListedPage {
    pub status: u16,
    pub repos: Vec<RepoDescriptor>,
}

/// Paged access to the remote repository catalog. Pages are numbered from 1.
pub trait RepoLister {
    fn list_page(&self, page: u32) -> Result<ListedPage, ListError>;
}

/// Walk pages from 1 until an empty one and concatenate them in order.
///
/// Any failing page aborts the whole sweep; nothing collected so far escapes.
pub fn fetch_catalog(lister: &dyn RepoLister) -> Result<Vec<RepoDescriptor>, ListError> {
    let mut repos = Vec::new();
    let mut page = 0u32;

    loop {
        page += 1;
        log::info!("Fetching page {} of repository listing...", page);
        let listed = lister.list_page(page)?;
        if listed.status != STATUS_OK {
            return Err(ListError::Status {
                status: listed.status,
                payload: serde_json::to_string(&listed.repos).unwrap_or_default(),
            });
        }
        if listed.repos.is_empty() {
            break;
        }
        repos.extend(listed.repos);
    }

    log::info!("Listed {} repositories in {} pages", repos.len(), page - 1);
    Ok(repos)
}
