//! Command-line parsing for ghsh: environment expansion, tokenizing and the
//! pipeline grammar (`|`, `<`, `>`, `>>`, `<<`, `&`).

mod error;
mod expand;
mod line_source;
mod parse;
mod tokenize;

pub use error::ParseError;
pub use expand::expand_env;
pub use expand::expand_env_with;
pub use line_source::LineSource;
pub use parse::Command;
pub use parse::HEREDOC_PROMPT;
pub use parse::InputSource;
pub use parse::OutputRedirect;
pub use parse::Pipeline;
pub use parse::parse_line;
pub use parse::parse_tokens;
pub use tokenize::Token;
pub use tokenize::tokenize;
