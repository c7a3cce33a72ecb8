//! Chat Completions client used by ghsh's AI mode.

pub mod auth;
pub mod common;
pub mod endpoint;
pub mod error;
pub mod provider;
pub mod requests;

pub use crate::auth::AuthProvider;
pub use crate::common::ChatMessage;
pub use crate::common::Role;
pub use crate::endpoint::chat::CHAT_COMPLETIONS_PATH;
pub use crate::endpoint::chat::ChatClient;
pub use crate::error::ApiError;
pub use crate::provider::Provider;
pub use crate::requests::chat::ChatRequest;
pub use crate::requests::chat::ChatRequestBuilder;
pub use ghsh_client::TransportError;
