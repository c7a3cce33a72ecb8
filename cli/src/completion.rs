//! Tab completion for the line editor.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use ghsh_core::Builtin;
use rustyline::Context;
use rustyline::Helper;
use rustyline::completion::Completer;
use rustyline::completion::FilenameCompleter;
use rustyline::completion::Pair;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;

/// Characters that end a word for completion purposes.
const WORD_BREAKS: &[char] = &[' ', '\t', '|', '<', '>', '&'];

/// Completes the first word of a command against built-ins and `PATH`
/// executables, and later words against file names.
pub struct ShellHelper {
    /// Sorted, collected once at startup.
    commands: Vec<String>,
    files: FilenameCompleter,
}

impl ShellHelper {
    pub fn new(commands: Vec<String>) -> Self {
        Self {
            commands,
            files: FilenameCompleter::new(),
        }
    }

    fn complete_command(&self, start: usize, word: &str) -> (usize, Vec<Pair>) {
        let candidates = self
            .commands
            .iter()
            .filter(|command| command.starts_with(word))
            .map(|command| Pair {
                display: command.clone(),
                replacement: command.clone(),
            })
            .collect();
        (start, candidates)
    }

    fn complete_file(&self, line: &str, pos: usize, dirs_only: bool) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, mut candidates) = self.files.complete_path(line, pos)?;
        if dirs_only {
            candidates.retain(|pair| pair.replacement.ends_with('/'));
        }
        Ok((start, candidates))
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        match classify(line, pos) {
            WordKind::Command { start } => Ok(self.complete_command(start, &line[start..pos])),
            WordKind::Argument { after_cd } => self.complete_file(line, pos, after_cd),
        }
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

#[derive(Debug, PartialEq, Eq)]
enum WordKind {
    Command { start: usize },
    Argument { after_cd: bool },
}

/// Decides whether the word ending at `pos` names a command (start of the
/// line or right after `|`) or an argument.
fn classify(line: &str, pos: usize) -> WordKind {
    let before = &line[..pos];
    let start = word_start(before);
    let head = before[..start].trim_end();
    if head.is_empty() || head.ends_with('|') {
        return WordKind::Command { start };
    }

    let segment = head.rsplit('|').next().unwrap_or(head);
    let mut words = segment.split_whitespace();
    let after_cd = words.next() == Some("cd") && words.next().is_none();
    WordKind::Argument { after_cd }
}

/// Byte offset where the word ending at the end of `before` begins. A
/// backslash-escaped break character stays inside the word.
fn word_start(before: &str) -> usize {
    let mut start = 0;
    let mut escaped = false;
    for (index, c) in before.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if WORD_BREAKS.contains(&c) {
            start = index + c.len_utf8();
        }
    }
    start
}

/// Built-in names plus every executable file found on `path_var`, sorted
/// and de-duplicated.
pub fn collect_commands(path_var: Option<&OsStr>) -> Vec<String> {
    let mut commands: BTreeSet<String> = Builtin::NAMES.into_iter().map(String::from).collect();
    if let Some(path_var) = path_var {
        for dir in std::env::split_paths(path_var) {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                if is_executable(&entry.path())
                    && let Some(name) = entry.file_name().to_str()
                {
                    commands.insert(name.to_string());
                }
            }
        }
    }
    commands.into_iter().collect()
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
