//! Repository descriptors as returned by the GitHub API, and the validated
//! key derived from their `full_name`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Branch name that marks a repository as a GitHub Pages site.
pub const PAGES_BRANCH: &str = "gh-pages";

/// Error type for `full_name` parsing failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("value cannot be empty")]
    Empty,
    #[error("invalid character in value: {0}")]
    InvalidCharacter(char),
    #[error("value cannot start with '{0}'")]
    InvalidStart(char),
    #[error("{0:?} is not a usable path component")]
    Reserved(String),
    #[error("missing separator '/' in full name")]
    MissingSeparator,
    #[error("invalid owner: {0}")]
    InvalidOwner(#[source] Box<ParseError>),
    #[error("invalid repo: {0}")]
    InvalidRepo(#[source] Box<ParseError>),
}

/// Owner login of a repository (user or organization).
///
/// Alphanumerics, `-` and `_`, not starting with a hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner(String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Owner {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        if s.starts_with('-') {
            return Err(ParseError::InvalidStart('-'));
        }
        if let Some(c) = s
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_'))
        {
            return Err(ParseError::InvalidCharacter(c));
        }
        Ok(Owner(s.to_string()))
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Repository name.
///
/// Alphanumerics, `-`, `_` and `.`. A leading dot is allowed (`.github`),
/// but `.` and `..` are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo(String);

impl Repo {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Repo {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        if s == "." || s == ".." {
            return Err(ParseError::Reserved(s.to_string()));
        }
        if let Some(c) = s
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '-' | '_' | '.'))
        {
            return Err(ParseError::InvalidCharacter(c));
        }
        Ok(Repo(s.to_string()))
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated `owner/name` pair; the only thing ever joined onto the checkout directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoKey {
    pub owner: Owner,
    pub repo: Repo,
}

impl RepoKey {
    pub fn new(owner: Owner, repo: Repo) -> Self {
        Self { owner, repo }
    }

    /// Location of this repository's mirror: `{checkout_dir}/{owner}/{repo}`
    pub fn mirror_path(&self, checkout_dir: &Path) -> PathBuf {
        checkout_dir.join(self.owner.as_str()).join(self.repo.as_str())
    }
}

impl FromStr for RepoKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner_str, repo_str) = s.split_once('/').ok_or(ParseError::MissingSeparator)?;

        let owner = owner_str
            .parse::<Owner>()
            .map_err(|e| ParseError::InvalidOwner(Box::new(e)))?;
        let repo = repo_str
            .parse::<Repo>()
            .map_err(|e| ParseError::InvalidRepo(Box::new(e)))?;

        Ok(RepoKey { owner, repo })
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Owner object nested in a repository descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// One entry of the `/user/repos` listing.
///
/// Only the fields the mirror needs are kept; anything else in the API
/// payload is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDescriptor {
    pub full_name: String,
    pub name: String,
    pub owner: RepoOwner,
    #[serde(default)]
    pub description: Option<String>,
    pub default_branch: String,
    #[serde(default)]
    pub homepage: Option<String>,
    pub clone_url: String,
    pub git_url: String,
    pub ssh_url: String,
    pub html_url: String,
}

impl RepoDescriptor {
    /// Parse and validate `full_name`.
    pub fn key(&self) -> Result<RepoKey, ParseError> {
        self.full_name.parse()
    }

    /// Description with an absent value treated as empty.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Homepage, if the remote has a non-empty one.
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref().filter(|h| !h.is_empty())
    }

    /// Space-joined clone URLs in `git_url ssh_url clone_url` order.
    pub fn clone_urls(&self) -> String {
        [
            self.git_url.as_str(),
            self.ssh_url.as_str(),
            self.clone_url.as_str(),
        ]
        .join(" ")
    }

    pub fn serves_pages(&self) -> bool {
        self.default_branch == PAGES_BRANCH
    }
}

/// Descriptor fixture shared by tests across modules.
#[cfg(test)]
pub(crate) fn test_descriptor(full_name: &str) -> RepoDescriptor {
    let (owner, name) = full_name.split_once('/').unwrap_or(("octocat", full_name));
    RepoDescriptor {
        full_name: full_name.to_string(),
        name: name.to_string(),
        owner: RepoOwner {
            login: owner.to_string(),
        },
        description: Some(format!("{} description", name)),
        default_branch: "main".to_string(),
        homepage: None,
        clone_url: format!("https://github.com/{}.git", full_name),
        git_url: format!("git://github.com/{}.git", full_name),
        ssh_url: format!("git@github.com:{}.git", full_name),
        html_url: format!("https://github.com/{}", full_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repo_key_tests {
        use super::*;

        #[test]
        fn parses_owner_and_repo() {
            let key: RepoKey = "my-org/my_repo.v2".parse().unwrap();
            assert_eq!(key.owner.as_str(), "my-org");
            assert_eq!(key.repo.as_str(), "my_repo.v2");
            assert_eq!(key.to_string(), "my-org/my_repo.v2");
        }

        #[test]
        fn accepts_dot_prefixed_repos() {
            for name in ["octocat/.github", "octocat/.dotfiles", "octocat/..."] {
                let key: RepoKey = name.parse().unwrap();
                assert_eq!(key.to_string(), name);
            }
            assert_eq!(
                "octocat/.github"
                    .parse::<RepoKey>()
                    .unwrap()
                    .mirror_path(Path::new("/srv/git")),
                PathBuf::from("/srv/git/octocat/.github")
            );
        }

        #[test]
        fn rejects_missing_separator() {
            assert_eq!(
                "octocat".parse::<RepoKey>(),
                Err(ParseError::MissingSeparator)
            );
        }

        #[test]
        fn rejects_traversal_components() {
            assert!(matches!(
                "../etc".parse::<RepoKey>(),
                Err(ParseError::InvalidOwner(_))
            ));
            assert_eq!(
                "..".parse::<Repo>(),
                Err(ParseError::Reserved("..".to_string()))
            );
            assert_eq!(
                ".".parse::<Repo>(),
                Err(ParseError::Reserved(".".to_string()))
            );
            assert!(matches!(
                "octocat/a/b".parse::<RepoKey>(),
                Err(ParseError::InvalidRepo(_))
            ));
            assert_eq!(
                "a\\b".parse::<Repo>(),
                Err(ParseError::InvalidCharacter('\\'))
            );
            assert_eq!(
                "a\nb".parse::<Repo>(),
                Err(ParseError::InvalidCharacter('\n'))
            );
            assert_eq!("".parse::<Repo>(), Err(ParseError::Empty));
        }

        #[test]
        fn owner_rules() {
            assert_eq!(
                "-user".parse::<Owner>(),
                Err(ParseError::InvalidStart('-'))
            );
            assert_eq!(
                "my_org".parse::<Owner>().unwrap().as_str(),
                "my_org"
            );
            assert_eq!(
                "ghe-user_corp".parse::<Owner>().unwrap().as_str(),
                "ghe-user_corp"
            );
            assert_eq!(
                "my.org".parse::<Owner>(),
                Err(ParseError::InvalidCharacter('.'))
            );
        }

        #[test]
        fn mirror_path_joins_owner_and_repo() {
            let key: RepoKey = "octocat/hello-world".parse().unwrap();
            assert_eq!(
                key.mirror_path(Path::new("/var/lib/git")),
                PathBuf::from("/var/lib/git/octocat/hello-world")
            );
        }
    }

    mod descriptor_tests {
        use super::*;

        const API_ENTRY: &str = r#"{
            "id": 1296269,
            "name": "Hello-World",
            "full_name": "octocat/Hello-World",
            "owner": { "login": "octocat", "id": 1 },
            "private": false,
            "html_url": "https://github.com/octocat/Hello-World",
            "description": null,
            "homepage": "",
            "default_branch": "master",
            "git_url": "git://github.com/octocat/Hello-World.git",
            "ssh_url": "git@github.com:octocat/Hello-World.git",
            "clone_url": "https://github.com/octocat/Hello-World.git"
        }"#;

        #[test]
        fn deserializes_api_entry_ignoring_extra_fields() {
            let repo: RepoDescriptor = serde_json::from_str(API_ENTRY).unwrap();
            assert_eq!(repo.full_name, "octocat/Hello-World");
            assert_eq!(repo.owner.login, "octocat");
            assert_eq!(repo.description, None);
            assert_eq!(repo.homepage(), None);
            assert_eq!(repo.description_or_empty(), "");
            assert_eq!(repo.key().unwrap().repo.as_str(), "Hello-World");
        }

        #[test]
        fn clone_urls_are_in_fixed_order() {
            let repo: RepoDescriptor = serde_json::from_str(API_ENTRY).unwrap();
            assert_eq!(
                repo.clone_urls(),
                "git://github.com/octocat/Hello-World.git \
                 git@github.com:octocat/Hello-World.git \
                 https://github.com/octocat/Hello-World.git"
            );
        }

        #[test]
        fn pages_branch_detection() {
            let mut repo = test_descriptor("octocat/site");
            assert!(!repo.serves_pages());
            repo.default_branch = PAGES_BRANCH.to_string();
            assert!(repo.serves_pages());
        }
    }
}
