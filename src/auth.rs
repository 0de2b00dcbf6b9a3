//! GitHub token resolution.

use thiserror::Error;

use crate::mirror::GitCli;

/// Environment variable checked first.
pub const TOKEN_ENV: &str = "GH_TOKEN";
/// Git config key checked when the environment has no token.
pub const TOKEN_CONFIG_KEY: &str = "github.token";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no GitHub token: set GH_TOKEN or run `git config --global github.token <token>`")]
    Missing,
}

/// Resolve the API token: `$GH_TOKEN`, then `git config github.token`.
pub fn resolve_token(git: &GitCli) -> Result<String, AuthError> {
    pick_token(std::env::var(TOKEN_ENV).ok(), || {
        match git.config_get(TOKEN_CONFIG_KEY) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Could not read {} from git config: {}", TOKEN_CONFIG_KEY, e);
                None
            }
        }
    })
}

/// First non-blank candidate wins; the config lookup only runs if needed.
fn pick_token(
    from_env: Option<String>,
    from_config: impl FnOnce() -> Option<String>,
) -> Result<String, AuthError> {
    let non_blank = |t: String| {
        let t = t.trim().to_string();
        (!t.is_empty()).then_some(t)
    };

    if let Some(token) = from_env.and_then(non_blank) {
        log::debug!("Using GitHub token from {}", TOKEN_ENV);
        return Ok(token);
    }
    if let Some(token) = from_config().and_then(non_blank) {
        log::debug!("Using GitHub token from git config {}", TOKEN_CONFIG_KEY);
        return Ok(token);
    }
    Err(AuthError::Missing)
}
