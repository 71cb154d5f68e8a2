use color_eyre::eyre::{eyre, Result};
use std::time::Duration;
use tokio::process::Command;

const GIT_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn current_branch() -> Result<String> {
    let out = run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
    if out.is_empty() || out == "HEAD" {
        return Err(eyre!("Could not detect branch (detached HEAD?). Use --ref."));
    }
    Ok(out)
}

pub async fn remote_url(remote: &str) -> Result<String> {
    run_git(&["remote", "get-url", remote])
        .await
        .map_err(|e| eyre!("Could not read remote '{remote}': {e}"))
}

async fn run_git(args: &[&str]) -> Result<String> {
    // kill_on_drop so a hung git is not left behind when the timeout fires
    let output = tokio::time::timeout(
        GIT_TIMEOUT,
        Command::new("git").args(args).kill_on_drop(true).output(),
    )
    .await
    .map_err(|_| eyre!("git command timed out after {}s", GIT_TIMEOUT.as_secs()))?
    .map_err(|e| eyre!("Failed to run git: {}", e))?;

    if !output.status.success() {
        return Err(eyre!(
            "git {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Extracts `group/.../project` from a git remote URL.
///
/// Supports SSH scp-form (`git@host:group/project.git`), `ssh://` URLs and
/// HTTPS URLs, with or without the trailing `.git`.
pub fn project_path(url: &str) -> Result<String> {
    let url = url.trim();
    let path = if let Some(rest) = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")) {
        let (_host, path) = rest
            .split_once('/')
            .ok_or_else(|| eyre!("No project path in remote URL '{url}'"))?;
        path
    } else if let Some(rest) = url.strip_prefix("ssh://") {
        let rest = rest.split_once('@').map_or(rest, |(_, r)| r);
        let (_host, path) = rest
            .split_once('/')
            .ok_or_else(|| eyre!("No project path in remote URL '{url}'"))?;
        path
    } else if let Some((_userhost, path)) = url.split_once(':') {
        // scp-form: git@host:group/project.git
        path
    } else {
        return Err(eyre!("Unrecognized remote URL '{url}'"));
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if path.is_empty() {
        return Err(eyre!("Empty project path in remote URL '{url}'"));
    }
    Ok(path.to_string())
}

/// Base URL of the GitLab instance serving `url`. An explicit override wins;
/// otherwise the host is taken from the remote URL and assumed HTTPS.
pub fn gitlab_base_url(url: &str, override_url: Option<&str>) -> String {
    if let Some(o) = override_url {
        return o.trim_end_matches('/').to_string();
    }
    let url = url.trim();
    let host = if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("ssh://"))
    {
        let rest = rest.split_once('@').map_or(rest, |(_, r)| r);
        rest.split(['/', ':']).next().unwrap_or(rest)
    } else {
        // scp-form
        let rest = url.split_once('@').map_or(url, |(_, r)| r);
        rest.split(':').next().unwrap_or(rest)
    };
    format!("https://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_path_ssh_scp_form() {
        assert_eq!(
            project_path("git@example.com:group/sub/project.git").unwrap(),
            "group/sub/project"
        );
    }

    #[test]
    fn project_path_https_with_git_suffix() {
        assert_eq!(
            project_path("https://example.com/group/project.git").unwrap(),
            "group/project"
        );
    }

    #[test]
    fn project_path_https_without_suffix() {
        assert_eq!(
            project_path("https://example.com/group/project").unwrap(),
            "group/project"
        );
    }

    #[test]
    fn project_path_ssh_url_form() {
        assert_eq!(
            project_path("ssh://git@example.com/group/project.git").unwrap(),
            "group/project"
        );
    }

    #[test]
    fn project_path_deep_namespace() {
        assert_eq!(
            project_path("https://gitlab.com/a/b/c/d.git").unwrap(),
            "a/b/c/d"
        );
    }

    #[test]
    fn project_path_rejects_garbage() {
        assert!(project_path("not a url").is_err());
        assert!(project_path("https://example.com").is_err());
    }

    #[tokio::test]
    async fn unknown_remote_is_an_error() {
        // exercises the spawn/timeout plumbing end to end; fails whether
        // git is missing or the remote does not exist
        let err = remote_url("glpw-test-remote-that-does-not-exist")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("glpw-test-remote"));
    }

    #[test]
    fn base_url_override_wins() {
        assert_eq!(
            gitlab_base_url("git@example.com:g/p.git", Some("https://gitlab.corp.net/")),
            "https://gitlab.corp.net"
        );
    }

    #[test]
    fn base_url_from_scp_form() {
        assert_eq!(
            gitlab_base_url("git@example.com:g/p.git", None),
            "https://example.com"
        );
    }

    #[test]
    fn base_url_from_https() {
        assert_eq!(
            gitlab_base_url("https://gitlab.com/g/p.git", None),
            "https://gitlab.com"
        );
    }

    #[test]
    fn base_url_from_ssh_url() {
        assert_eq!(
            gitlab_base_url("ssh://git@gitlab.com/g/p.git", None),
            "https://gitlab.com"
        );
    }
}
