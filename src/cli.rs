use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "glpw", version, about = "GitLab Pipeline Watcher TUI")]
pub struct Cli {
    /// Git remote to resolve the project from
    #[arg(long, default_value = "origin")]
    pub remote: String,

    /// GitLab base URL (auto-detected from the remote URL)
    #[arg(long)]
    pub gitlab_url: Option<String>,

    /// API token (falls back to $GLPW_TOKEN, then $GITLAB_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Branch/ref to show the pipeline for (auto-detected from cwd)
    #[arg(long = "ref")]
    pub git_ref: Option<String>,

    /// Log poll interval in seconds for running/pending jobs
    #[arg(short, long, default_value_t = 5)]
    pub interval: u64,

    /// Write debug logs to $XDG_STATE_HOME/glpw/debug.log
    #[arg(long)]
    pub verbose: bool,
}
