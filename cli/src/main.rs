use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

use clap::Parser;
use ghsh_core::Session;
use ghsh_core::banner;
use ghsh_core::config::Config;
use ghsh_core::config::ConfigOverrides;
use ghsh_core::config::log_dir;
use ghsh_core::pipeline::ignore_interactive_signals;
use ghsh_core::source_file;
use ghsh_core::source_startup_files;
use ghsh_shell_command::LineSource;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod completion;

use crate::completion::ShellHelper;
use crate::completion::collect_commands;

const DEFAULT_LOG_FILTER: &str = "ghsh_core=info,ghsh_cli=info,ghsh_api=info";

/// Ghost Shell: an interactive shell with an AI command mode.
#[derive(Debug, Parser)]
#[clap(author, version, bin_name = "ghsh")]
struct Cli {
    /// Run COMMAND and exit with its status.
    #[arg(short = 'c', value_name = "COMMAND", conflicts_with = "script")]
    command: Option<String>,

    /// Model used by `call` and `ask`.
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Do not source ~/.ghsh_profile and ~/.ghshrc.
    #[arg(long = "norc")]
    no_rc: bool,

    /// Run the commands in SCRIPT instead of reading them interactively.
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let status = runtime.block_on(run(cli))?;
    drop(runtime);
    std::process::exit(status);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let Cli {
        command,
        model,
        no_rc,
        script,
    } = cli;

    let config = Config::load_with_overrides(ConfigOverrides { model })?;
    let _log_guard = match init_logging(&config) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("ghsh: logging disabled: {err}");
            None
        }
    };
    info!(version = env!("CARGO_PKG_VERSION"), "ghsh starting");

    let mut session = Session::new(config)?;

    if let Some(command) = command {
        session
            .execute_line(&command, &mut std::iter::empty::<String>())
            .await;
        return Ok(session.exit_status());
    }
    if let Some(script) = script {
        source_file(&mut session, script).await;
        return Ok(session.exit_status());
    }

    run_interactive(&mut session, no_rc).await?;
    info!(status = session.exit_status(), "ghsh exiting");
    Ok(session.exit_status())
}

/// Read/execute loop over the line editor.
async fn run_interactive(session: &mut Session, no_rc: bool) -> anyhow::Result<()> {
    ignore_interactive_signals();
    let interactive = std::io::stdin().is_terminal();
    if interactive {
        println!("{}", banner());
    }
    if !no_rc {
        source_startup_files(session).await;
    }

    let path_var = std::env::var_os("PATH");
    let mut editor: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(ShellHelper::new(collect_commands(path_var.as_deref()))));
    if let Some(path) = session.history_log().path()
        && let Err(err) = editor.load_history(path)
    {
        debug!("no history loaded from {}: {err}", path.display());
    }

    while !session.should_exit() {
        session.reap_jobs();
        let prompt = session.prompt();
        match editor.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                session.record_history(&line);
                session
                    .execute_line(&line, &mut EditorLines(&mut editor))
                    .await;
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                if interactive {
                    println!("exit");
                }
                break;
            }
            Err(err) => {
                error!("line editor failed: {err}");
                return Err(err.into());
            }
        }
    }
    Ok(())
}

/// Here-document bodies typed at the `> ` continuation prompt.
struct EditorLines<'a>(&'a mut Editor<ShellHelper, DefaultHistory>);

impl LineSource for EditorLines<'_> {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.0.readline(prompt).ok()
    }
}

/// Writes logs to `<ghsh_home>/log/ghsh.log`. The terminal stays clean.
fn init_logging(config: &Config) -> anyhow::Result<WorkerGuard> {
    let log_dir = log_dir(config);
    std::fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(log_dir.join("ghsh.log"))?;
    let (non_blocking, guard) = non_blocking(log_file);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_ansi(false)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(guard)
}
