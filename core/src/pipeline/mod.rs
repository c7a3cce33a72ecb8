//! Runs parsed pipelines as child processes.

mod jobs;
mod plan;
mod resolve;
mod spawn;

use std::ffi::CString;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::os::fd::OwnedFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use ghsh_shell_command::Command;
use ghsh_shell_command::Pipeline;
use tracing::info;
use tracing::warn;

use crate::error::ExecError;
use spawn::ChildAction;
use spawn::LaunchError;
use spawn::PreparedStage;

pub use jobs::FinishedJob;
pub use jobs::JobTable;
pub use plan::StagePlan;
pub use plan::StdinPlan;
pub use plan::StdoutPlan;
pub use plan::plan_pipeline;
pub use plan::plan_stage;
pub use resolve::EXIT_NOT_EXECUTABLE;
pub use resolve::EXIT_NOT_FOUND;
pub use resolve::Resolution;
pub use resolve::resolve_in_env;
pub use resolve::resolve_program;
pub use spawn::ignore_interactive_signals;
pub(crate) use spawn::reset_child_signals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launched {
    /// Foreground pipeline finished with the last stage's status.
    Foreground(i32),
    /// Background pipeline registered in the job table.
    Background { job: usize, pid: libc::pid_t },
}

/// Launches `pipeline` in `cwd`. Redirection files are opened and programs
/// resolved before anything is forked, so a bad redirection aborts the line
/// without side effects.
pub fn execute(
    pipeline: &Pipeline,
    cwd: &Path,
    jobs: &mut JobTable,
    cmdline: &str,
) -> Result<Launched, ExecError> {
    let plans = plan_pipeline(pipeline);
    let mut prepared = Vec::with_capacity(plans.len());
    for (command, plan) in pipeline.stages.iter().zip(plans) {
        prepared.push(prepare_stage(command, plan, cwd)?);
    }

    // Children inherit our stdio; anything still buffered would otherwise
    // show up after their output.
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();

    let pids = match spawn::launch(prepared) {
        Ok(pids) => pids,
        Err(LaunchError { error, launched }) => {
            // Stages already running are not killed; the job table reaps them.
            if !launched.is_empty() {
                warn!(stages = launched.len(), "pipeline launch failed partway: {error}");
                jobs.add(launched, cmdline);
            }
            return Err(error);
        }
    };
    info!(
        stages = pids.len(),
        background = pipeline.background,
        "launched pipeline"
    );

    if pipeline.background {
        let pid = pids.last().copied().unwrap_or_default();
        let job = jobs.add(pids, cmdline);
        return Ok(Launched::Background { job, pid });
    }

    spawn::wait_all(&pids)
        .map(Launched::Foreground)
        .map_err(ExecError::Wait)
}

fn prepare_stage(command: &Command, plan: StagePlan, cwd: &Path) -> Result<PreparedStage, ExecError> {
    let stdin = match plan.stdin {
        StdinPlan::File(path) => Some(open_input(&path, cwd)?),
        StdinPlan::HereDoc(text) => Some(stage_heredoc(&text)?),
        StdinPlan::Inherit | StdinPlan::PipeFromPrevious => None,
    };
    let stdout = match plan.stdout {
        StdoutPlan::File { path, append } => Some(open_output(&path, append, cwd)?),
        StdoutPlan::Inherit | StdoutPlan::PipeToNext => None,
    };

    let action = match resolve_in_env(&command.name, cwd) {
        Resolution::Found(program) => {
            let program = CString::new(program.as_os_str().as_bytes())
                .map_err(|_| ExecError::NulByte(command.name.clone()))?;
            let argv = command
                .args
                .iter()
                .map(|arg| CString::new(arg.as_str()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ExecError::NulByte(command.name.clone()))?;
            ChildAction::Exec {
                program,
                argv,
                exec_failure: format!("ghsh: {}: cannot execute\n", command.name).into_bytes(),
            }
        }
        Resolution::NotFound => ChildAction::Fail {
            message: format!("ghsh: {}: command not found\n", command.name).into_bytes(),
            code: EXIT_NOT_FOUND,
        },
        Resolution::NotExecutable => ChildAction::Fail {
            message: format!("ghsh: {}: permission denied\n", command.name).into_bytes(),
            code: EXIT_NOT_EXECUTABLE,
        },
    };

    Ok(PreparedStage {
        action,
        stdin,
        stdout,
    })
}

fn open_input(path: &str, cwd: &Path) -> Result<OwnedFd, ExecError> {
    File::open(cwd.join(path))
        .map(OwnedFd::from)
        .map_err(|source| ExecError::Redirect {
            path: path.to_string(),
            source,
        })
}

fn open_output(path: &str, append: bool, cwd: &Path) -> Result<OwnedFd, ExecError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(cwd.join(path))
        .map(OwnedFd::from)
        .map_err(|source| ExecError::Redirect {
            path: path.to_string(),
            source,
        })
}

/// Here-document text lives in an anonymous temporary file that becomes the
/// stage's stdin.
fn stage_heredoc(text: &str) -> Result<OwnedFd, ExecError> {
    let mut file = tempfile::tempfile().map_err(ExecError::HereDoc)?;
    file.write_all(text.as_bytes()).map_err(ExecError::HereDoc)?;
    file.seek(SeekFrom::Start(0)).map_err(ExecError::HereDoc)?;
    Ok(OwnedFd::from(file))
}
