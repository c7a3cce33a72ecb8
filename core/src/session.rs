//! One interactive shell session: working directory, exit latch, last
//! status, history, background jobs and (once used) the AI context.

use std::io::Write;
use std::path::PathBuf;

use ghsh_shell_command::LineSource;
use ghsh_shell_command::parse_line;
use ghsh_utils_home_dir::user_home;
use tracing::info;
use tracing::warn;

use crate::builtins;
use crate::builtins::Builtin;
use crate::config::Config;
use crate::ghost::AiContext;
use crate::ghost::CompletionService;
use crate::history_log::HistoryLog;
use crate::pipeline;
use crate::pipeline::JobTable;
use crate::pipeline::Launched;
use crate::prompt::color_enabled;
use crate::prompt::current_user;
use crate::prompt::format_prompt;

/// Lazily created AI context. A failed creation is remembered so later
/// `call`/`ask` invocations report the same reason without retrying.
pub(crate) enum AiState {
    Uninitialized,
    Ready(Box<AiContext>),
    Unavailable(String),
}

pub struct Session {
    pub(crate) config: Config,
    pub(crate) cwd: PathBuf,
    /// Set once by `exit`; never cleared.
    exit_status: Option<i32>,
    pub(crate) last_status: i32,
    pub(crate) history: HistoryLog,
    pub(crate) ai: AiState,
    jobs: JobTable,
    pub(crate) out: Box<dyn Write>,
    pub(crate) err: Box<dyn Write>,
    pub(crate) source_depth: usize,
}

impl Session {
    pub fn new(config: Config) -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        let history = HistoryLog::new(config.history_file.clone());
        Ok(Self {
            config,
            cwd,
            exit_status: None,
            last_status: 0,
            history,
            ai: AiState::Uninitialized,
            jobs: JobTable::new(),
            out: Box::new(std::io::stdout()),
            err: Box::new(std::io::stderr()),
            source_depth: 0,
        })
    }

    /// Sends built-in output and diagnostics somewhere other than the
    /// process stdio. Child processes still inherit the real descriptors.
    pub fn with_output(mut self, out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        self.out = out;
        self.err = err;
        self
    }

    /// Uses `service` for AI requests instead of the configured endpoint.
    pub fn with_completion_service(mut self, service: Box<dyn CompletionService>) -> Self {
        self.ai = AiState::Ready(Box::new(AiContext::new(service, &self.config)));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cwd(&self) -> &std::path::Path {
        &self.cwd
    }

    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    pub fn history_log(&self) -> &HistoryLog {
        &self.history
    }

    pub fn background_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn ai_context(&self) -> Option<&AiContext> {
        match &self.ai {
            AiState::Ready(ai) => Some(ai),
            AiState::Uninitialized | AiState::Unavailable(_) => None,
        }
    }

    pub fn should_exit(&self) -> bool {
        self.exit_status.is_some()
    }

    /// Status the process should exit with: the `exit` argument if one was
    /// given, otherwise the last foreground status.
    pub fn exit_status(&self) -> i32 {
        self.exit_status.unwrap_or(self.last_status)
    }

    pub(crate) fn request_exit(&mut self, status: i32) {
        if self.exit_status.is_none() {
            info!(status, "exit requested");
            self.exit_status = Some(status);
        }
    }

    pub fn prompt(&self) -> String {
        let home = user_home().ok();
        format_prompt(&current_user(), &self.cwd, home.as_deref(), color_enabled())
    }

    /// Parses and runs one line. `input` supplies here-document bodies.
    /// Returns the line's status; a parse error leaves the previous status
    /// in place.
    pub async fn execute_line(&mut self, line: &str, input: &mut dyn LineSource) -> i32 {
        let pipeline = match parse_line(line, input) {
            Ok(Some(pipeline)) => pipeline,
            Ok(None) => return self.last_status,
            Err(err) => {
                self.report(&err.to_string());
                return self.last_status;
            }
        };

        let builtin = pipeline
            .single()
            .and_then(|command| Builtin::lookup(&command.name).map(|builtin| (builtin, command)));
        let status = if let Some((builtin, command)) = builtin {
            builtins::run(self, builtin, &command.args).await
        } else {
            match pipeline::execute(&pipeline, &self.cwd, &mut self.jobs, line) {
                Ok(Launched::Foreground(status)) => status,
                Ok(Launched::Background { job, pid }) => {
                    let _ = writeln!(self.out, "[{job}] {pid}");
                    0
                }
                Err(err) => {
                    warn!("pipeline failed: {err}");
                    self.report(&err.to_string());
                    1
                }
            }
        };

        self.last_status = status;
        status
    }

    /// Appends `line` to the persisted history file.
    pub fn record_history(&self, line: &str) {
        if let Err(err) = self.history.append(line) {
            warn!("failed to write history: {err}");
        }
    }

    /// Collects finished background jobs and announces them.
    pub fn reap_jobs(&mut self) {
        for job in self.jobs.reap() {
            info!(job = job.id, status = job.status, "background job finished");
            let _ = if job.status == 0 {
                writeln!(self.out, "[{}] Done {}", job.id, job.cmdline)
            } else {
                writeln!(self.out, "[{}] Exit {} {}", job.id, job.status, job.cmdline)
            };
        }
        let _ = self.out.flush();
    }

    /// Writes a one-line `ghsh:` diagnostic.
    pub(crate) fn report(&mut self, message: &str) {
        let _ = writeln!(self.err, "ghsh: {message}");
        let _ = self.err.flush();
    }
}
