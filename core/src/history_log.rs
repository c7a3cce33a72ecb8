//! Persistence for interactive command history.
//!
//! The file (`~/.ghost_history` by default) stores one command per line. Each
//! entry is written with a single `write(2)` on a descriptor opened with
//! `O_APPEND`, so concurrent shells appending to the same file do not
//! interleave partial lines.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Result;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: Option<PathBuf>,
}

impl HistoryLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Appends `line` as one entry. Embedded newlines are flattened so one
    /// entry always occupies one line.
    pub fn append(&self, line: &str) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let line = line.trim_end();
        if line.is_empty() {
            return Ok(());
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut entry = line.replace('\n', " ");
        entry.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .mode(0o600)
            .open(path)?;

        let metadata = file.metadata()?;
        if metadata.permissions().mode() & 0o777 != 0o600 {
            let mut perms = metadata.permissions();
            perms.set_mode(0o600);
            file.set_permissions(perms)?;
        }

        file.write_all(entry.as_bytes())?;
        file.flush()
    }

    /// All persisted entries, oldest first. A missing file is empty history.
    pub fn entries(&self) -> Result<Vec<String>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        match std::fs::read(path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}
