use crate::cli::Cli;
use color_eyre::eyre::{eyre, Result};

/// Token sources, in resolution order.
pub const TOKEN_ENV_PRIMARY: &str = "GLPW_TOKEN";
pub const TOKEN_ENV_FALLBACK: &str = "GITLAB_TOKEN";

/// Everything the remote client needs to talk to one project on one
/// GitLab instance. Immutable after startup.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub base_url: String,
    pub token: String,
    pub project_path: String,
}

/// Resolves the API token: `$GLPW_TOKEN`, then `$GITLAB_TOKEN`, then the
/// `--token` flag. Failing all three is fatal before any fetch is attempted.
pub fn resolve_token(cli: &Cli) -> Result<String> {
    resolve_token_from(cli.token.as_deref(), |name| std::env::var(name).ok())
}

fn resolve_token_from(
    flag: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    for name in [TOKEN_ENV_PRIMARY, TOKEN_ENV_FALLBACK] {
        if let Some(token) = env(name) {
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }
    }
    if let Some(token) = flag {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }
    Err(eyre!(
        "No GitLab token found. Set ${TOKEN_ENV_PRIMARY} or ${TOKEN_ENV_FALLBACK}, or pass --token."
    ))
}
