use std::io;

use ghsh_api::ApiError;
use thiserror::Error;

/// Failures while setting up or launching a pipeline. Each aborts the current
/// line only.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{path}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to stage here-document: {0}")]
    HereDoc(#[source] io::Error),

    #[error("{0}: argument contains a NUL byte")]
    NulByte(String),

    #[error("failed to create pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("fork failed: {0}")]
    Fork(#[source] io::Error),

    #[error("waitpid failed: {0}")]
    Wait(#[source] io::Error),
}

/// Why the API key could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("{0} is not set")]
    Missing(String),

    #[error("{0} does not look like an API key (expected an `sk-` prefix)")]
    BadPrefix(String),

    #[error("{0} is too short")]
    TooShort(String),
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("failed to set up HTTP client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Api(#[from] ApiError),

    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),
}
