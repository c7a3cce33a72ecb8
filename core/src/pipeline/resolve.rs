use std::ffi::OsStr;
use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

/// Exit status for a command that could not be found.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit status for a command that exists but cannot be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(PathBuf),
    NotFound,
    NotExecutable,
}

/// Resolves `name` the way `execvp` would: names containing `/` are used
/// as given (relative to `cwd`); anything else is looked up in `path_var`
/// in order, first executable match wins.
pub fn resolve_program(name: &str, path_var: Option<&OsStr>, cwd: &Path) -> Resolution {
    if name.is_empty() {
        return Resolution::NotFound;
    }

    if name.contains('/') {
        let candidate = cwd.join(name);
        return if is_executable_file(&candidate) {
            Resolution::Found(PathBuf::from(name))
        } else if candidate.exists() {
            Resolution::NotExecutable
        } else {
            Resolution::NotFound
        };
    }

    let Some(path_var) = path_var else {
        return Resolution::NotFound;
    };
    match which::which_in(name, Some(path_var), cwd) {
        Ok(found) => Resolution::Found(found),
        Err(_) => {
            let shadowed = std::env::split_paths(path_var)
                .map(|dir| cwd.join(dir).join(name))
                .any(|candidate| candidate.exists());
            if shadowed {
                Resolution::NotExecutable
            } else {
                Resolution::NotFound
            }
        }
    }
}

/// Resolves against the current process `PATH`.
pub fn resolve_in_env(name: &str, cwd: &Path) -> Resolution {
    let path_var: Option<OsString> = std::env::var_os("PATH");
    resolve_program(name, path_var.as_deref(), cwd)
}

fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::ffi::OsStrExt;

    if !path.is_file() {
        return false;
    }
    let Ok(c_path) = std::ffi::CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_path` is a valid NUL-terminated string for the duration of
    // the call.
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}
