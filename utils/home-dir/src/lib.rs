//! Where ghsh keeps its files.
//!
//! Two roots matter: the config home (`config.toml`, `log/`), which is
//! `$GHSH_HOME` or `~/.ghsh`, and the user's home, which holds the dotfiles
//! (`.ghost_history`, `.ghsh_profile`, `.ghshrc`).

use std::io;
use std::path::Path;
use std::path::PathBuf;

pub const GHSH_HOME_ENV: &str = "GHSH_HOME";

const CONFIG_DIR_NAME: &str = ".ghsh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhshDirs {
    config_home: PathBuf,
    user_home: Option<PathBuf>,
}

impl GhshDirs {
    /// Resolves both roots from the environment. An explicit `GHSH_HOME`
    /// must name an existing directory; the `~/.ghsh` default may not exist
    /// yet.
    pub fn discover() -> io::Result<Self> {
        let config_override = std::env::var_os(GHSH_HOME_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::resolve(config_override, dirs::home_dir())
    }

    fn resolve(config_override: Option<PathBuf>, user_home: Option<PathBuf>) -> io::Result<Self> {
        let config_home = match config_override {
            Some(dir) => existing_dir(&dir)?,
            None => user_home
                .as_deref()
                .map(|home| home.join(CONFIG_DIR_NAME))
                .ok_or_else(missing_home)?,
        };
        Ok(Self {
            config_home,
            user_home,
        })
    }

    pub fn config_home(&self) -> &Path {
        &self.config_home
    }

    /// `name` under the user's home, if there is one.
    pub fn dotfile(&self, name: &str) -> Option<PathBuf> {
        self.user_home.as_deref().map(|home| home.join(name))
    }
}

/// The user's home as the environment says right now. Looked up on every
/// call so `export HOME=...` is honoured by `cd` and the prompt.
pub fn user_home() -> io::Result<PathBuf> {
    dirs::home_dir().ok_or_else(missing_home)
}

fn existing_dir(dir: &Path) -> io::Result<PathBuf> {
    let canonical = dir.canonicalize().map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("{GHSH_HOME_ENV} {}: {err}", dir.display()),
        )
    })?;
    if !canonical.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{GHSH_HOME_ENV} {} is not a directory", dir.display()),
        ));
    }
    Ok(canonical)
}

fn missing_home() -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        "could not determine the home directory",
    )
}
