use async_trait::async_trait;
use ghsh_api::ApiError;
use ghsh_api::ChatClient;
use ghsh_api::ChatMessage;
use ghsh_api::ChatRequestBuilder;
use ghsh_api::Provider;
use ghsh_client::ReqwestTransport;

use crate::config::Config;
use crate::error::AiError;
use crate::ghost::credential::ApiKey;

/// The chat-completion RPC behind AI mode: ordered messages in, assistant
/// text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// `instructions` become the leading system message; `input` follows in
    /// order.
    async fn complete(&self, instructions: &str, input: &[ChatMessage]) -> Result<String, ApiError>;
}

/// Chat Completions over HTTP, authenticated with the user's API key.
pub struct OpenAiCompletion {
    client: ChatClient<ReqwestTransport, ApiKey>,
    model: String,
}

impl OpenAiCompletion {
    /// Validates the credential and builds the HTTP client. Fails without
    /// touching the network.
    pub fn from_config(config: &Config) -> Result<Self, AiError> {
        let key = ApiKey::from_env(&config.api_key_env)?;
        let transport = ReqwestTransport::with_default_settings()
            .map_err(|err| AiError::Client(err.to_string()))?;
        let provider = Provider::openai(config.base_url.clone(), config.request_timeout);
        Ok(Self {
            client: ChatClient::new(transport, provider, key),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, instructions: &str, input: &[ChatMessage]) -> Result<String, ApiError> {
        let request = ChatRequestBuilder::new(&self.model, instructions, input).build();
        self.client.complete(request).await
    }
}
