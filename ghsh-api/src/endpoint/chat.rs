use crate::auth::AuthProvider;
use crate::auth::add_auth_headers;
use crate::error::ApiError;
use crate::provider::Provider;
use crate::requests::chat::ChatRequest;
use ghsh_client::HttpTransport;
use http::Method;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;

pub const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

pub struct ChatClient<T: HttpTransport, A: AuthProvider> {
    transport: T,
    provider: Provider,
    auth: A,
}

impl<T: HttpTransport, A: AuthProvider> ChatClient<T, A> {
    pub fn new(transport: T, provider: Provider, auth: A) -> Self {
        Self {
            transport,
            provider,
            auth,
        }
    }

    /// Sends one non-streaming completion request and returns the assistant
    /// text from `choices[0].message.content`.
    pub async fn complete(&self, request: ChatRequest) -> Result<String, ApiError> {
        let mut req = self
            .provider
            .build_request(Method::POST, CHAT_COMPLETIONS_PATH);
        req.body = Some(request.body);
        let req = add_auth_headers(&self.auth, req);

        let resp = self.transport.execute(req).await?;
        debug!(
            provider = %self.provider.name,
            bytes = resp.body.len(),
            "chat completion received"
        );
        extract_content(&resp.body)
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Pulls the assistant text out of a Chat Completions response body.
pub fn extract_content(body: &[u8]) -> Result<String, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::EmptyResponse);
    }

    let parsed: CompletionResponse = serde_json::from_slice(body).map_err(|e| {
        warn!(body = %String::from_utf8_lossy(body), "undecodable completion response");
        ApiError::Decode(e.to_string())
    })?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or(ApiError::MissingContent)?;

    if content.trim().is_empty() {
        return Err(ApiError::EmptyResponse);
    }
    Ok(content)
}
