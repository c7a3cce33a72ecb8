use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::error::AiError;
use crate::ghost::AiContext;
use crate::ghost::capture::capture_command;
use crate::ghost::decompose::decompose;
use crate::ghost::preview::PreviewOutcome;
use crate::ghost::preview::preview_command;
use crate::ghost::prompts::analysis_prompt;
use crate::ghost::prompts::follow_up_prompt;
use crate::ghost::prompts::is_success;

/// How a `call` ended. `attempts` counts follow-up requests sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostOutcome {
    /// The model reported `SUCCESS`.
    Success { attempts: u32 },
    /// The model ran out of commands to suggest.
    Unresolved { attempts: u32 },
    /// The follow-up ceiling was reached.
    AttemptsExhausted { attempts: u32 },
}

impl GhostOutcome {
    pub fn exit_status(self) -> i32 {
        match self {
            GhostOutcome::Success { .. } => 0,
            GhostOutcome::Unresolved { .. } | GhostOutcome::AttemptsExhausted { .. } => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Shown in front of each suggested command while it can be edited.
    pub preview_prompt: String,
    pub preview_window: Duration,
    pub max_attempts: u32,
}

/// Turns `request` into commands, runs them, and keeps asking the model to
/// check and correct the result until it reports success, stops suggesting
/// commands, or `max_attempts` follow-ups have been spent.
pub async fn run_ghost_loop(
    ai: &mut AiContext,
    request: &str,
    cwd: &Path,
    out: &mut dyn Write,
    settings: &LoopSettings,
) -> Result<GhostOutcome, AiError> {
    ai.set_ghost_mode(true);
    let reply = ai.request(request).await?;
    let mut queue: VecDeque<String> = decompose(&reply).into();
    let mut attempts = 0;

    while let Some(candidate) = queue.pop_front() {
        let outcome = preview_command(
            out,
            &settings.preview_prompt,
            &candidate,
            settings.preview_window,
        )
        .map_err(AiError::Terminal)?;
        let command = match outcome {
            PreviewOutcome::Run(command) if !command.trim().is_empty() => command,
            PreviewOutcome::Run(_) | PreviewOutcome::Cancelled => {
                info!("skipped suggested command: {candidate:?}");
                continue;
            }
        };

        let output = match capture_command(&command, cwd).await {
            Ok(captured) => {
                debug!(status = captured.status, "captured suggested command");
                captured.text
            }
            Err(err) => {
                warn!("failed to run suggested command {command:?}: {err}");
                format!("ghsh: {command}: {err}\n")
            }
        };
        out.write_all(output.as_bytes())
            .and_then(|()| out.flush())
            .map_err(AiError::Terminal)?;
        ai.record_command_output(&output);

        ai.set_ghost_mode(false);
        let analysis = ai.request(&analysis_prompt(request, &output)).await?;
        if is_success(&analysis) {
            return Ok(GhostOutcome::Success { attempts });
        }
        if attempts >= settings.max_attempts {
            info!(attempts, "follow-up ceiling reached");
            return Ok(GhostOutcome::AttemptsExhausted { attempts });
        }

        attempts += 1;
        ai.set_ghost_mode(true);
        let follow_up = ai
            .request(&follow_up_prompt(request, &output, &analysis))
            .await?;
        if is_success(&follow_up) {
            return Ok(GhostOutcome::Success { attempts });
        }
        let corrected = decompose(&follow_up);
        if !corrected.is_empty() {
            queue = corrected.into();
        }
    }

    Ok(GhostOutcome::Unresolved { attempts })
}
