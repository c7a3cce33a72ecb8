use ghsh_client::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("completion service returned an empty response")]
    EmptyResponse,

    #[error("failed to decode completion response: {0}")]
    Decode(String),

    #[error("completion response has no `choices[0].message.content`")]
    MissingContent,
}
