use tracing::warn;

use crate::LineSource;
use crate::ParseError;
use crate::expand::expand_env;
use crate::tokenize::Token;
use crate::tokenize::tokenize;

/// Continuation prompt shown while reading a here-document body.
pub const HEREDOC_PROMPT: &str = "> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(String),
    HereDoc(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    pub path: String,
    pub append: bool,
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    /// Full argument vector; `args[0] == name`.
    pub args: Vec<String>,
    pub input: Option<InputSource>,
    pub output: Option<OutputRedirect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Command>,
    pub background: bool,
}

impl Pipeline {
    /// The single stage of a pipeline without `|`.
    pub fn single(&self) -> Option<&Command> {
        match self.stages.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// Expands, tokenizes and parses one input line. Blank lines yield `None`.
pub fn parse_line(
    line: &str,
    heredoc_input: &mut dyn LineSource,
) -> Result<Option<Pipeline>, ParseError> {
    parse_tokens(tokenize(&expand_env(line)), heredoc_input)
}

/// Stage input before here-document bodies have been read.
enum PendingInput {
    File(String),
    HereDoc { delimiter: String },
}

struct PendingStage {
    args: Vec<String>,
    input: Option<PendingInput>,
    output: Option<OutputRedirect>,
}

/// Builds a [`Pipeline`] from tokens. The whole line is validated before any
/// here-document body is requested from `heredoc_input`, so a syntax error
/// never leaves the user typing a body for a command that will not run.
pub fn parse_tokens(
    mut tokens: Vec<Token>,
    heredoc_input: &mut dyn LineSource,
) -> Result<Option<Pipeline>, ParseError> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let background = tokens.last() == Some(&Token::Background);
    if background {
        tokens.pop();
    }
    if tokens.contains(&Token::Background) {
        return Err(ParseError::MisplacedBackground);
    }

    let mut pending = Vec::new();
    for segment in tokens.split(|token| *token == Token::Pipe) {
        pending.push(parse_segment(segment)?);
    }

    let stages = pending
        .into_iter()
        .map(|stage| {
            let input = stage.input.map(|input| match input {
                PendingInput::File(path) => InputSource::File(path),
                PendingInput::HereDoc { delimiter } => {
                    InputSource::HereDoc(read_heredoc(&delimiter, heredoc_input))
                }
            });
            Command {
                name: stage.args[0].clone(),
                args: stage.args,
                input,
                output: stage.output,
            }
        })
        .collect();

    Ok(Some(Pipeline { stages, background }))
}

fn parse_segment(segment: &[Token]) -> Result<PendingStage, ParseError> {
    let mut stage = PendingStage {
        args: Vec::new(),
        input: None,
        output: None,
    };
    let mut iter = segment.iter();

    while let Some(token) = iter.next() {
        match token {
            Token::Word(word) => stage.args.push(word.clone()),
            Token::RedirectIn => {
                let path = target(iter.next()).ok_or(ParseError::MissingRedirectTarget("<"))?;
                stage.input = Some(PendingInput::File(path));
            }
            Token::HereDoc => {
                let delimiter = target(iter.next()).ok_or(ParseError::MissingHereDocDelimiter)?;
                stage.input = Some(PendingInput::HereDoc { delimiter });
            }
            Token::RedirectOut | Token::RedirectAppend => {
                let append = *token == Token::RedirectAppend;
                let op = if append { ">>" } else { ">" };
                let path = target(iter.next()).ok_or(ParseError::MissingRedirectTarget(op))?;
                stage.output = Some(OutputRedirect { path, append });
            }
            Token::Pipe => unreachable!("segments are split on `|`"),
            Token::Background => return Err(ParseError::MisplacedBackground),
        }
    }

    if stage.args.is_empty() {
        return Err(ParseError::EmptyCommand);
    }
    Ok(stage)
}

fn target(token: Option<&Token>) -> Option<String> {
    match token {
        Some(Token::Word(word)) => Some(word.clone()),
        _ => None,
    }
}

fn read_heredoc(delimiter: &str, input: &mut dyn LineSource) -> String {
    let mut body = String::new();
    loop {
        match input.read_line(HEREDOC_PROMPT) {
            Some(line) if line.trim_end_matches(['\r', '\n']) == delimiter => return body,
            Some(line) => {
                body.push_str(line.trim_end_matches(['\r', '\n']));
                body.push('\n');
            }
            None => {
                warn!("here-document delimited by end of input (wanted `{delimiter}`)");
                return body;
            }
        }
    }
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
