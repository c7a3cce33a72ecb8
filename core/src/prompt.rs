use std::path::Path;

use owo_colors::OwoColorize;
use supports_color::Stream;

/// User name shown in front of AI-suggested commands.
pub const GHOST_USER: &str = "ghost";

/// Whether prompt colours should be emitted on stdout.
pub fn color_enabled() -> bool {
    supports_color::on_cached(Stream::Stdout).is_some()
}

/// Login name from the environment, or `user` when unknown.
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "user".to_string())
}

/// Renders `user@ghsh:<dir>$ `.
pub fn format_prompt(user: &str, cwd: &Path, home: Option<&Path>, color: bool) -> String {
    let dir = display_dir(cwd, home);
    if color {
        format!("{}@ghsh:{}$ ", user.cyan(), dir.yellow())
    } else {
        format!("{user}@ghsh:{dir}$ ")
    }
}

/// `cwd` with a leading home directory replaced by `~`. `/home/al` does not
/// abbreviate `/home/alice`.
pub fn display_dir(cwd: &Path, home: Option<&Path>) -> String {
    let Some(home) = home.filter(|home| home.as_os_str().len() > 1) else {
        return cwd.display().to_string();
    };
    match cwd.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => cwd.display().to_string(),
    }
}
