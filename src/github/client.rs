//! Blocking GitHub REST client for the authenticated user's repositories.

use std::time::Duration;

use super::{ListError, ListedPage, RepoLister};
use crate::types::RepoDescriptor;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Repositories requested per page; the sweep only relies on the empty-page sentinel.
const PER_PAGE: &str = "100";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Lists `/user/repos` page by page with a personal access token.
pub struct GithubClient {
    agent: ureq::Agent,
    api_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        let agent = ureq::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("gh-mirror/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn repos_url(&self) -> String {
        format!("{}/user/repos", self.api_url)
    }
}

impl RepoLister for GithubClient {
    fn list_page(&self, page: u32) -> Result<ListedPage, ListError> {
        let result = self
            .agent
            .get(&self.repos_url())
            .set("Authorization", &format!("token {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .query("page", &page.to_string())
            .query("per_page", PER_PAGE)
            .call();

        match result {
            Ok(response) => {
                let status = response.status();
                let body = response.into_string()?;
                let repos: Vec<RepoDescriptor> = serde_json::from_str(&body)?;
                Ok(ListedPage { status, repos })
            }
            Err(ureq::Error::Status(status, response)) => Err(ListError::Status {
                status,
                payload: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(e)) => Err(ListError::Transport(e.to_string())),
        }
    }
}
