//! Raw `fork`/`exec` for pipeline stages.
//!
//! Everything the child needs (argument vectors, resolved program paths,
//! diagnostics, descriptors) is prepared before forking so the child only
//! performs async-signal-safe calls: `signal`, `dup2`, `fcntl`, `execv`,
//! `write` and `_exit`.

use std::ffi::CString;
use std::io;
use std::os::fd::AsRawFd;
use std::os::fd::FromRawFd;
use std::os::fd::OwnedFd;
use std::os::fd::RawFd;

use tracing::debug;

use crate::error::ExecError;
use crate::pipeline::resolve::EXIT_NOT_EXECUTABLE;
use crate::pipeline::resolve::EXIT_NOT_FOUND;

/// What the child does after wiring its descriptors.
pub(crate) enum ChildAction {
    Exec {
        program: CString,
        argv: Vec<CString>,
        /// Written to stderr if `execv` itself fails.
        exec_failure: Vec<u8>,
    },
    /// Print `message` to stderr and exit with `code` without exec'ing.
    Fail { message: Vec<u8>, code: i32 },
}

/// One stage ready to fork. `stdin`/`stdout` carry redirection files only;
/// pipes between stages are created by [`launch`].
pub(crate) struct PreparedStage {
    pub action: ChildAction,
    pub stdin: Option<OwnedFd>,
    pub stdout: Option<OwnedFd>,
}

/// A pipe or fork failed after `launched` stages were already running.
#[derive(Debug)]
pub(crate) struct LaunchError {
    pub error: ExecError,
    pub launched: Vec<libc::pid_t>,
}

/// Forks every stage, connecting neighbours with pipes. Returns the child
/// pids in stage order.
///
/// If a pipe or fork fails midway, stages already launched keep running with
/// their pipe ends closed, so they see EOF or `EPIPE`. Their pids come back in
/// the error and are not waited for here.
pub(crate) fn launch(stages: Vec<PreparedStage>) -> Result<Vec<libc::pid_t>, LaunchError> {
    launch_with(stages, create_pipe)
}

fn launch_with(
    stages: Vec<PreparedStage>,
    mut make_pipe: impl FnMut() -> io::Result<(OwnedFd, OwnedFd)>,
) -> Result<Vec<libc::pid_t>, LaunchError> {
    let count = stages.len();
    let mut pids = Vec::with_capacity(count);
    let mut prev_read: Option<OwnedFd> = None;

    for (index, stage) in stages.into_iter().enumerate() {
        let next_pipe = if index + 1 < count {
            match make_pipe() {
                Ok(pipe) => Some(pipe),
                Err(err) => {
                    return Err(LaunchError {
                        error: ExecError::Pipe(err),
                        launched: pids,
                    });
                }
            }
        } else {
            None
        };

        let PreparedStage {
            action,
            stdin,
            stdout,
        } = stage;
        let stdin_fd = prev_read.as_ref().or(stdin.as_ref()).map(AsRawFd::as_raw_fd);
        let stdout_fd = next_pipe
            .as_ref()
            .map(|(_, write)| write)
            .or(stdout.as_ref())
            .map(AsRawFd::as_raw_fd);

        // Prepared up front so the child does not allocate.
        let argv_ptrs = match &action {
            ChildAction::Exec { argv, .. } => {
                let mut ptrs: Vec<*const libc::c_char> =
                    argv.iter().map(|arg| arg.as_ptr()).collect();
                ptrs.push(std::ptr::null());
                ptrs
            }
            ChildAction::Fail { .. } => Vec::new(),
        };

        // SAFETY: the child branch below only makes async-signal-safe calls
        // on memory prepared before the fork.
        let pid = unsafe { libc::fork() };
        if pid < 0 {
            return Err(LaunchError {
                error: ExecError::Fork(io::Error::last_os_error()),
                launched: pids,
            });
        }

        if pid == 0 {
            // SAFETY: we are in the freshly forked child; `run_child` never
            // returns and only uses async-signal-safe calls.
            unsafe { run_child(stdin_fd, stdout_fd, &action, &argv_ptrs) }
        }

        debug!(pid, stage = index, "launched pipeline stage");
        pids.push(pid);

        // Parent: our copies of this stage's stdin and the pipe's write end
        // are no longer needed. The read end feeds the next stage.
        drop(stdin);
        drop(stdout);
        prev_read = next_pipe.map(|(read, write)| {
            drop(write);
            read
        });
    }

    Ok(pids)
}

/// Waits for every pid and returns the status of the last one, mapping
/// signal termination to `128 + signal`.
pub(crate) fn wait_all(pids: &[libc::pid_t]) -> io::Result<i32> {
    let mut last_status = 0;
    for &pid in pids {
        last_status = wait_pid(pid)?;
    }
    Ok(last_status)
}

fn wait_pid(pid: libc::pid_t) -> io::Result<i32> {
    loop {
        let mut status: libc::c_int = 0;
        // SAFETY: `status` is a valid out-pointer for the duration of the call.
        let res = unsafe { libc::waitpid(pid, &mut status as *mut libc::c_int, 0) };
        if res < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        return Ok(decode_wait_status(status));
    }
}

/// Non-blocking check used for background jobs. `Some(status)` once `pid`
/// has exited (or no longer exists).
pub(crate) fn try_wait_pid(pid: libc::pid_t) -> Option<i32> {
    let mut status: libc::c_int = 0;
    // SAFETY: `status` is a valid out-pointer for the duration of the call.
    let res = unsafe { libc::waitpid(pid, &mut status as *mut libc::c_int, libc::WNOHANG) };
    match res {
        0 => None,
        r if r < 0 => Some(0),
        _ => Some(decode_wait_status(status)),
    }
}

pub(crate) fn decode_wait_status(status: libc::c_int) -> i32 {
    if libc::WIFEXITED(status) {
        libc::WEXITSTATUS(status)
    } else if libc::WIFSIGNALED(status) {
        128 + libc::WTERMSIG(status)
    } else {
        status
    }
}

fn create_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut pipe_fds = [0; 2];
    // SAFETY: `pipe_fds` has room for the two descriptors `pipe2` writes.
    let res = unsafe { libc::pipe2(pipe_fds.as_mut_ptr(), libc::O_CLOEXEC) };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `pipe2` succeeded, so both descriptors are open and owned by us.
    let read = unsafe { OwnedFd::from_raw_fd(pipe_fds[0]) };
    let write = unsafe { OwnedFd::from_raw_fd(pipe_fds[1]) };
    Ok((read, write))
}

/// Makes the shell itself immune to terminal `SIGINT`/`SIGQUIT` so that
/// Ctrl-C stops the foreground job rather than the shell. Children restore
/// the defaults before exec.
pub fn ignore_interactive_signals() {
    // SAFETY: installs `SIG_IGN`, which runs no handler code.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_IGN);
        libc::signal(libc::SIGQUIT, libc::SIG_IGN);
    }
}

/// Restores default dispositions for signals the shell ignores. Safe to call
/// between `fork` and `exec`.
pub(crate) fn reset_child_signals() {
    // SAFETY: `signal` with `SIG_DFL` is async-signal-safe and runs no
    // handler code.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
        libc::signal(libc::SIGQUIT, libc::SIG_DFL);
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// # Safety
///
/// Must only be called in a freshly forked child. Never returns.
unsafe fn run_child(
    stdin_fd: Option<RawFd>,
    stdout_fd: Option<RawFd>,
    action: &ChildAction,
    argv_ptrs: &[*const libc::c_char],
) -> ! {
    reset_child_signals();

    // SAFETY: `argv_ptrs` is NUL-terminated and points into `action`, which
    // outlives the `execv` call.
    unsafe {
        if let Some(fd) = stdin_fd {
            redirect_fd(fd, libc::STDIN_FILENO);
        }
        if let Some(fd) = stdout_fd {
            redirect_fd(fd, libc::STDOUT_FILENO);
        }
        // Every other descriptor we opened is O_CLOEXEC and disappears on
        // exec; on the failure paths `_exit` closes them.

        match action {
            ChildAction::Fail { message, code } => {
                write_stderr(message);
                libc::_exit(*code);
            }
            ChildAction::Exec {
                program,
                exec_failure,
                ..
            } => {
                libc::execv(program.as_ptr(), argv_ptrs.as_ptr());
                let errno = io::Error::last_os_error().raw_os_error();
                write_stderr(exec_failure);
                let code = if errno == Some(libc::ENOENT) {
                    EXIT_NOT_FOUND
                } else {
                    EXIT_NOT_EXECUTABLE
                };
                libc::_exit(code);
            }
        }
    }
}

/// # Safety
///
/// Child-side only; may `_exit` the process.
unsafe fn redirect_fd(fd: RawFd, target: RawFd) {
    // SAFETY: plain descriptor syscalls on integers we own in the child.
    unsafe {
        if fd == target {
            // dup2 onto itself keeps O_CLOEXEC set; clear it instead.
            let flags = libc::fcntl(fd, libc::F_GETFD);
            if flags >= 0 {
                libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC);
            }
            return;
        }
        if libc::dup2(fd, target) < 0 {
            write_stderr(b"ghsh: failed to redirect descriptor\n");
            libc::_exit(EXIT_NOT_EXECUTABLE);
        }
    }
}

/// # Safety
///
/// Writes to fd 2 directly; callers must not rely on Rust's stderr buffering.
unsafe fn write_stderr(message: &[u8]) {
    // SAFETY: `message` is valid for `message.len()` bytes.
    unsafe {
        libc::write(
            libc::STDERR_FILENO,
            message.as_ptr().cast::<libc::c_void>(),
            message.len(),
        );
    }
}
