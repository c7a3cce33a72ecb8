use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::trace;

use crate::pipeline::reset_child_signals;

/// Shell used to run AI-suggested commands.
const CAPTURE_SHELL: &str = "/bin/sh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: i32,
    /// stdout followed by stderr, decoded lossily.
    pub text: String,
}

/// Runs `command` through `sh -c` in `cwd` and collects its output instead of
/// connecting it to the terminal.
pub async fn capture_command(command: &str, cwd: &Path) -> std::io::Result<CapturedOutput> {
    trace!("capture_command: {command:?} in {cwd:?}");

    let mut cmd = Command::new(CAPTURE_SHELL);
    cmd.arg("-c").arg(command).current_dir(cwd);

    // The interactive shell ignores SIGINT/SIGQUIT; the command must not
    // inherit that.
    unsafe {
        cmd.pre_exec(|| {
            reset_child_signals();
            Ok(())
        });
    }

    // No stdin: a command waiting for input would otherwise hang the loop.
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let output = cmd.kill_on_drop(true).output().await?;
    let status = output
        .status
        .code()
        .or_else(|| output.status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1);

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(CapturedOutput { status, text })
}
