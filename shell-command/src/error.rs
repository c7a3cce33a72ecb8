use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error: empty command")]
    EmptyCommand,

    #[error("syntax error: expected a file name after `{0}`")]
    MissingRedirectTarget(&'static str),

    #[error("syntax error: expected a delimiter after `<<`")]
    MissingHereDocDelimiter,

    #[error("syntax error: `&` is only allowed at the end of the line")]
    MisplacedBackground,
}
