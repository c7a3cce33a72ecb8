use ghsh_shell_command::Command;
use ghsh_shell_command::InputSource;
use ghsh_shell_command::Pipeline;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinPlan {
    Inherit,
    PipeFromPrevious,
    File(String),
    HereDoc(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutPlan {
    Inherit,
    PipeToNext,
    File { path: String, append: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    pub stdin: StdinPlan,
    pub stdout: StdoutPlan,
}

/// Maps one stage to its stdin source and stdout sink.
///
/// Only the first stage's input redirection and the last stage's output
/// redirection are honoured; everything between neighbouring stages is a
/// pipe. Redirections that lose to a pipe are dropped with a warning.
pub fn plan_stage(index: usize, count: usize, command: &Command) -> StagePlan {
    let first = index == 0;
    let last = index + 1 == count;

    let stdin = match (&command.input, first) {
        (Some(InputSource::File(path)), true) => StdinPlan::File(path.clone()),
        (Some(InputSource::HereDoc(text)), true) => StdinPlan::HereDoc(text.clone()),
        (None, true) => StdinPlan::Inherit,
        (input, false) => {
            if input.is_some() {
                warn!(stage = index, command = %command.name, "input redirection ignored: stage reads from a pipe");
            }
            StdinPlan::PipeFromPrevious
        }
    };

    let stdout = match (&command.output, last) {
        (Some(output), true) => StdoutPlan::File {
            path: output.path.clone(),
            append: output.append,
        },
        (None, true) => StdoutPlan::Inherit,
        (output, false) => {
            if output.is_some() {
                warn!(stage = index, command = %command.name, "output redirection ignored: stage writes to a pipe");
            }
            StdoutPlan::PipeToNext
        }
    };

    StagePlan { stdin, stdout }
}

pub fn plan_pipeline(pipeline: &Pipeline) -> Vec<StagePlan> {
    let count = pipeline.stages.len();
    pipeline
        .stages
        .iter()
        .enumerate()
        .map(|(index, command)| plan_stage(index, count, command))
        .collect()
}
