//! Commands handled inside the shell process. They only run for single-stage
//! lines; redirections and `&` on a built-in are ignored.

use std::future::Future;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::pin::Pin;

use ghsh_utils_home_dir::user_home;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::error::AiError;
use crate::ghost::AiContext;
use crate::ghost::GhostOutcome;
use crate::ghost::LoopSettings;
use crate::ghost::run_ghost_loop;
use crate::prompt::GHOST_USER;
use crate::prompt::color_enabled;
use crate::prompt::format_prompt;
use crate::session::AiState;
use crate::session::Session;

/// Per-user scripts sourced before the interactive loop, in order.
pub const STARTUP_FILES: [&str; 2] = [".ghsh_profile", ".ghshrc"];

/// Nested `source` calls deeper than this are refused.
const MAX_SOURCE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Exit,
    Help,
    History,
    Export,
    Source,
    Call,
    Ask,
}

impl Builtin {
    /// Every name that dispatches to a built-in, `.` included.
    pub const NAMES: [&'static str; 9] = [
        "cd", "exit", "help", "history", "export", "source", ".", "call", "ask",
    ];

    pub fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "cd" => Builtin::Cd,
            "exit" => Builtin::Exit,
            "help" => Builtin::Help,
            "history" => Builtin::History,
            "export" => Builtin::Export,
            "source" | "." => Builtin::Source,
            "call" => Builtin::Call,
            "ask" => Builtin::Ask,
            _ => return None,
        })
    }
}

/// Runs `builtin` with its full argument vector (`args[0]` is the name).
pub(crate) async fn run(session: &mut Session, builtin: Builtin, args: &[String]) -> i32 {
    let rest = args.get(1..).unwrap_or_default();
    match builtin {
        Builtin::Cd => cd(session, rest),
        Builtin::Exit => exit(session, rest),
        Builtin::Help => help(session),
        Builtin::History => history(session),
        Builtin::Export => export(session, rest),
        Builtin::Source => match rest.first() {
            Some(path) => source_file(session, PathBuf::from(path)).await,
            None => {
                session.report("source: filename argument required");
                2
            }
        },
        Builtin::Call => call(session, &rest.join(" ")).await,
        Builtin::Ask => ask(session, &rest.join(" ")).await,
    }
}

fn cd(session: &mut Session, args: &[String]) -> i32 {
    let target = match args.first() {
        Some(dir) => expand_tilde(dir),
        None => match user_home() {
            Ok(home) => home,
            Err(_) => {
                session.report("cd: HOME not set");
                return 1;
            }
        },
    };
    let target = session.cwd.join(target);

    if let Err(err) = std::env::set_current_dir(&target) {
        session.report(&format!("cd: {}: {err}", target.display()));
        return 1;
    }
    match std::env::current_dir() {
        Ok(cwd) => {
            info!(cwd = %cwd.display(), "changed directory");
            session.cwd = cwd;
            0
        }
        Err(err) => {
            session.report(&format!("cd: {err}"));
            1
        }
    }
}

fn expand_tilde(dir: &str) -> PathBuf {
    let rest = match dir.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(dir),
    };
    match user_home() {
        Ok(home) if rest.is_empty() => home,
        Ok(home) => home.join(rest),
        Err(_) => PathBuf::from(dir),
    }
}

fn exit(session: &mut Session, args: &[String]) -> i32 {
    let status = match args.first() {
        None => session.last_status,
        Some(arg) => match arg.parse::<i64>() {
            Ok(code) => code.rem_euclid(256) as i32,
            Err(_) => {
                session.report(&format!("exit: {arg}: numeric argument required"));
                2
            }
        },
    };
    session.request_exit(status);
    status
}

fn help(session: &mut Session) -> i32 {
    let _ = write!(
        session.out,
        "\nGhost Shell v{} - Built-in commands:\n\n\
         cd [dir]             Change the current directory (default: HOME)\n\
         exit [n]             Exit the shell with status n\n\
         help                 Display this help message\n\
         history              Display command history\n\
         export NAME=VALUE    Set an environment variable (no arguments: list them)\n\
         source FILE, . FILE  Run the commands in FILE\n\
         call PROMPT          Let the AI run commands for PROMPT and check the result\n\
         ask PROMPT           Show the AI's reply to PROMPT without running anything\n\n\
         Features:\n\
         - Pipelines with |, redirection with <, >, >> and here-documents with <<\n\
         - Background execution using &\n\
         - Command history (use arrow keys)\n\
         - Tab completion for commands and files\n\n",
        env!("CARGO_PKG_VERSION")
    );
    0
}

fn history(session: &mut Session) -> i32 {
    match session.history.entries() {
        Ok(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                let _ = writeln!(session.out, "{:5}  {entry}", index + 1);
            }
            0
        }
        Err(err) => {
            session.report(&format!("history: {err}"));
            1
        }
    }
}

fn export(session: &mut Session, args: &[String]) -> i32 {
    if args.is_empty() {
        let mut vars: Vec<(String, String)> = std::env::vars_os()
            .map(|(name, value)| {
                (
                    name.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect();
        vars.sort();
        for (name, value) in vars {
            let _ = writeln!(session.out, "{name}={value}");
        }
        return 0;
    }

    let mut status = 0;
    for arg in args {
        let (name, value) = arg.split_once('=').unwrap_or((arg.as_str(), ""));
        if !is_valid_name(name) {
            session.report(&format!("export: `{arg}': not a valid identifier"));
            status = 1;
            continue;
        }
        if !arg.contains('=') {
            // Already-set variables are exported by default.
            continue;
        }
        // SAFETY: the shell runs on a single thread and no other thread
        // reads or writes the environment.
        unsafe {
            std::env::set_var(name, value);
        }
    }
    status
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Runs every line of `path` in `session`. Blank lines and `#` comments are
/// skipped; here-document bodies come from the following lines of the file.
pub fn source_file(session: &mut Session, path: PathBuf) -> Pin<Box<dyn Future<Output = i32> + '_>> {
    Box::pin(async move {
        let path = session.cwd.join(path);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                session.report(&format!("source: {}: {err}", path.display()));
                return 1;
            }
        };
        run_script(session, &path, &text).await
    })
}

async fn run_script(session: &mut Session, path: &Path, text: &str) -> i32 {
    if session.source_depth >= MAX_SOURCE_DEPTH {
        session.report(&format!("source: {}: nested too deeply", path.display()));
        return 1;
    }
    session.source_depth += 1;

    let mut lines = text.lines().map(str::to_string);
    let mut status = 0;
    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        status = session.execute_line(&line, &mut lines).await;
        if session.should_exit() {
            break;
        }
    }

    session.source_depth -= 1;
    status
}

/// Sources `~/.ghsh_profile` then `~/.ghshrc`. Either file may be absent.
pub async fn source_startup_files(session: &mut Session) {
    let Ok(home) = user_home() else {
        return;
    };
    for name in STARTUP_FILES {
        let path = home.join(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                info!(path = %path.display(), "sourcing startup file");
                run_script(session, &path, &text).await;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => session.report(&format!("{}: {err}", path.display())),
        }
        if session.should_exit() {
            return;
        }
    }
}

/// Creates the AI context on first use. A failure is remembered for the
/// rest of the session.
fn ensure_ai<'a>(ai: &'a mut AiState, config: &Config) -> Result<&'a mut AiContext, String> {
    if matches!(ai, AiState::Uninitialized) {
        *ai = match AiContext::from_config(config) {
            Ok(context) => {
                info!(model = %config.model, "AI mode initialised");
                AiState::Ready(Box::new(context))
            }
            Err(err) => {
                warn!("AI mode unavailable: {err}");
                AiState::Unavailable(err.to_string())
            }
        };
    }
    match ai {
        AiState::Ready(context) => Ok(context),
        AiState::Unavailable(reason) => Err(reason.clone()),
        AiState::Uninitialized => Err("not initialised".to_string()),
    }
}

async fn call(session: &mut Session, prompt: &str) -> i32 {
    if prompt.trim().is_empty() {
        session.report("call: usage: call <prompt>");
        return 2;
    }
    let home = user_home().ok();
    let settings = LoopSettings {
        preview_prompt: format_prompt(GHOST_USER, &session.cwd, home.as_deref(), color_enabled()),
        preview_window: session.config.preview_window,
        max_attempts: session.config.max_followup_attempts,
    };

    let ai = match ensure_ai(&mut session.ai, &session.config) {
        Ok(ai) => ai,
        Err(reason) => {
            session.report(&format!("AI mode unavailable: {reason}"));
            return 1;
        }
    };
    let result = run_ghost_loop(ai, prompt, &session.cwd, session.out.as_mut(), &settings).await;

    match result {
        Ok(outcome) => {
            info!(?outcome, "call finished");
            match outcome {
                GhostOutcome::Success { .. } => {}
                GhostOutcome::Unresolved { .. } => {
                    session.report("call: no further commands were suggested");
                }
                GhostOutcome::AttemptsExhausted { attempts } => {
                    session.report(&format!("call: giving up after {attempts} follow-up attempts"));
                }
            }
            outcome.exit_status()
        }
        Err(err) => report_ai_error(session, "call", &err),
    }
}

async fn ask(session: &mut Session, prompt: &str) -> i32 {
    if prompt.trim().is_empty() {
        session.report("ask: usage: ask <prompt>");
        return 2;
    }

    let ai = match ensure_ai(&mut session.ai, &session.config) {
        Ok(ai) => ai,
        Err(reason) => {
            session.report(&format!("AI mode unavailable: {reason}"));
            return 1;
        }
    };
    ai.set_ghost_mode(false);

    match ai.request(prompt).await {
        Ok(reply) => {
            let _ = writeln!(session.out, "{}", reply.trim_end());
            let _ = session.out.flush();
            0
        }
        Err(err) => report_ai_error(session, "ask", &err),
    }
}

fn report_ai_error(session: &mut Session, builtin: &str, err: &AiError) -> i32 {
    warn!("{builtin} failed: {err}");
    session.report(&format!("{builtin}: {err}"));
    1
}
