pub mod auth;
pub mod cache;
pub mod github;
pub mod mirror;
pub mod runner;
pub mod types;

use std::path::PathBuf;

use clap::Parser;

use crate::cache::{CachePaths, MetadataCache, RunLock};
use crate::github::{DEFAULT_API_URL, GithubClient};
use crate::mirror::{GitCli, Libgit2Transport};
use crate::runner::{RunError, Runner, renew_if_due};

const DEFAULT_CHECKOUT_DIR: &str = "/var/lib/git/";

/// Fetch all user repos, and ensure all local checkouts are up to date
#[derive(Parser, Debug)]
#[command(name = "gh-mirror", version)]
struct Cli {
    /// Only work on repos whose full name starts with this prefix
    #[arg(default_value = "")]
    prefix: String,

    /// Renew the cached repository list
    #[arg(short = 'f', long)]
    renew_cache: bool,

    /// Directory holding the bare mirrors
    #[arg(short = 'd', long, default_value = DEFAULT_CHECKOUT_DIR)]
    checkout_dir: PathBuf,

    /// Git fetch repo updates
    #[arg(
        short = 'u',
        long,
        default_value = "true",
        value_parser = parse_bool,
        action = clap::ArgAction::Set
    )]
    fetch: bool,

    /// Cache database location [default: <user cache dir>/gh-mirror/cache.db]
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,
}

/// Lenient boolean in the spirit of `strtobool`.
fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        other => Err(format!("invalid truth value {:?}", other)),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every selected repository was mirrored.
fn run(cli: Cli) -> Result<bool, RunError> {
    let git = GitCli::new();
    let token = auth::resolve_token(&git)?;

    let paths = CachePaths::default();
    log::debug!("Cache directory {}", paths.root().display());
    let _lock = RunLock::try_acquire(&paths.lock_path())?
        .ok_or_else(|| RunError::Busy(paths.lock_path()))?;

    let cache_file = cli.cache_file.unwrap_or_else(|| paths.db_path());
    log::debug!("Using cache at {}", cache_file.display());
    let cache = MetadataCache::open(&cache_file)?;

    let client = GithubClient::new(cli.api_url, token.clone());
    renew_if_due(&cache, &client, cli.renew_cache)?;
    let repos = cache.get()?.unwrap_or_default();

    let transport = Libgit2Transport::new(Some(token));
    let runner = Runner::new(cli.checkout_dir, cli.fetch, &transport);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = runner.run(&repos, &cli.prefix, &mut out);

    for (full_name, err) in &summary.failed {
        eprintln!("Failed to mirror {}: {}", full_name, err);
    }
    Ok(summary.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_strtobool_spellings() {
        for yes in ["y", "YES", "t", "True", "on", "1"] {
            assert_eq!(parse_bool(yes), Ok(true), "{}", yes);
        }
        for no in ["n", "No", "f", "FALSE", "off", "0"] {
            assert_eq!(parse_bool(no), Ok(false), "{}", no);
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["gh-mirror"]).unwrap();
        assert_eq!(cli.prefix, "");
        assert!(!cli.renew_cache);
        assert_eq!(cli.checkout_dir, PathBuf::from("/var/lib/git/"));
        assert!(cli.fetch);
        assert!(cli.cache_file.is_none());
        assert_eq!(cli.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn short_flags() {
        let cli =
            Cli::try_parse_from(["gh-mirror", "octocat/", "-f", "-d", "/srv/git", "-u", "no"])
                .unwrap();
        assert_eq!(cli.prefix, "octocat/");
        assert!(cli.renew_cache);
        assert_eq!(cli.checkout_dir, PathBuf::from("/srv/git"));
        assert!(!cli.fetch);
    }

    #[test]
    fn fetch_rejects_garbage() {
        assert!(Cli::try_parse_from(["gh-mirror", "--fetch", "sometimes"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
