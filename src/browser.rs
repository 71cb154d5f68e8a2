use color_eyre::eyre::{eyre, Result};
use std::process::{Command, Stdio};

/// Joins the instance base URL with a GitLab `webPath` (always rooted).
pub fn web_url(base_url: &str, web_path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), web_path)
}

/// Launches the default browser for an http(s) URL.
///
/// Candidates are tried in order until one starts. WSL is detected at
/// runtime since it compiles as plain Linux.
pub fn open_in_browser(url: &str) -> Result<()> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(eyre!("Not an http(s) URL: {url}"));
    }

    for &(program, args) in launcher_candidates() {
        match spawn_detached(program, args, url) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(eyre!("{program} failed to start: {e}")),
        }
    }

    Err(eyre!(
        "No browser launcher found (install xdg-utils; under WSL install wslu)"
    ))
}

/// Launchers for the current platform, most specific first. The empty
/// argument before the URL on the `cmd` variants is the window title slot;
/// without it `start` would treat the URL as the title.
fn launcher_candidates() -> &'static [(&'static str, &'static [&'static str])] {
    if cfg!(target_os = "macos") {
        &[("open", &[])]
    } else if cfg!(target_os = "windows") {
        &[("cmd", &["/C", "start", ""])]
    } else if std::env::var_os("WSL_DISTRO_NAME").is_some() {
        // wslview comes from wslu; cmd.exe reaches the Windows side directly
        &[("wslview", &[]), ("cmd.exe", &["/C", "start", ""])]
    } else {
        &[("xdg-open", &[])]
    }
}

fn spawn_detached(program: &str, args: &[&str], url: &str) -> std::io::Result<()> {
    Command::new(program)
        .args(args)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}
