//! Short editable countdown shown before an AI-suggested command runs.

use std::io;
use std::io::IsTerminal;
use std::io::Write;
use std::time::Duration;
use std::time::Instant;

use crossterm::QueueableCommand;
use crossterm::cursor::MoveToColumn;
use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::style::Print;
use crossterm::terminal;
use crossterm::terminal::ClearType;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    Run(String),
    Cancelled,
}

/// Raw terminal mode for as long as the guard lives.
pub struct RawModeGuard(());

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            tracing::warn!("failed to restore terminal mode: {err}");
        }
    }
}

/// Shows `prompt` followed by `command` and lets the user edit it for the
/// whole of `window`. The window is not cut short by inactivity.
///
/// Without a terminal on stdin (or with a zero window) the command is only
/// echoed.
pub fn preview_command(
    out: &mut dyn Write,
    prompt: &str,
    command: &str,
    window: Duration,
) -> io::Result<PreviewOutcome> {
    if window.is_zero() || !io::stdin().is_terminal() {
        writeln!(out, "{prompt}{command}")?;
        out.flush()?;
        return Ok(PreviewOutcome::Run(command.to_string()));
    }

    let _raw = RawModeGuard::enable()?;
    let mut buffer = command.to_string();
    redraw(out, prompt, &buffer)?;

    let deadline = Instant::now() + window;
    while Instant::now() < deadline {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match apply_key(&mut buffer, key) {
            KeyOutcome::Edited => redraw(out, prompt, &buffer)?,
            KeyOutcome::Ignored => {}
            KeyOutcome::Cancel => {
                write!(out, "\r\n")?;
                out.flush()?;
                debug!("preview cancelled");
                return Ok(PreviewOutcome::Cancelled);
            }
        }
    }

    write!(out, "\r\n")?;
    out.flush()?;
    Ok(PreviewOutcome::Run(buffer))
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Edited,
    Ignored,
    Cancel,
}

fn apply_key(buffer: &mut String, key: KeyEvent) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Ignored;
    }
    match key.code {
        KeyCode::Esc => KeyOutcome::Cancel,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyOutcome::Cancel,
        KeyCode::Backspace => {
            if buffer.pop().is_some() {
                KeyOutcome::Edited
            } else {
                KeyOutcome::Ignored
            }
        }
        KeyCode::Char(c)
            if (' '..='~').contains(&c)
                && !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            buffer.push(c);
            KeyOutcome::Edited
        }
        _ => KeyOutcome::Ignored,
    }
}

fn redraw(out: &mut dyn Write, prompt: &str, buffer: &str) -> io::Result<()> {
    out.queue(MoveToColumn(0))?
        .queue(terminal::Clear(ClearType::CurrentLine))?
        .queue(Print(prompt))?
        .queue(Print(buffer))?;
    out.flush()
}
