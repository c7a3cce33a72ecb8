//! AI-assisted command mode: conversation state, request plumbing and the
//! execute/analyse/follow-up loop.

mod capture;
mod client;
mod credential;
mod decompose;
mod follow_up;
mod preview;
pub mod prompts;

use tracing::debug;

use crate::config::Config;
use crate::context_manager::ConversationHistory;
use crate::context_manager::MessageKind;
use crate::error::AiError;

pub use capture::CapturedOutput;
pub use capture::capture_command;
pub use client::CompletionService;
pub use client::OpenAiCompletion;
pub use credential::ApiKey;
pub use decompose::decompose;
pub use follow_up::GhostOutcome;
pub use follow_up::LoopSettings;
pub use follow_up::run_ghost_loop;
pub use preview::PreviewOutcome;
pub use preview::RawModeGuard;
pub use preview::preview_command;

/// State kept for the lifetime of a session once AI mode has been used.
pub struct AiContext {
    service: Box<dyn CompletionService>,
    system_prompt: String,
    history: ConversationHistory,
    last_response: Option<String>,
    /// When set, suggested commands are executed rather than only shown.
    ghost_mode: bool,
}

impl AiContext {
    pub fn new(service: Box<dyn CompletionService>, config: &Config) -> Self {
        Self {
            service,
            system_prompt: config.system_prompt.clone(),
            history: ConversationHistory::new(
                config.max_history_messages,
                config.max_message_bytes,
            ),
            last_response: None,
            ghost_mode: false,
        }
    }

    /// Validates the API key and connects to the configured endpoint.
    pub fn from_config(config: &Config) -> Result<Self, AiError> {
        let service = OpenAiCompletion::from_config(config)?;
        Ok(Self::new(Box::new(service), config))
    }

    /// Sends `prompt` after the conversation so far. The prompt is recorded
    /// before the request goes out; the reply only when one arrives.
    pub async fn request(&mut self, prompt: &str) -> Result<String, AiError> {
        self.history.append(MessageKind::User, prompt);
        let input = self.history.for_prompt();
        debug!(messages = input.len(), ghost_mode = self.ghost_mode, "sending AI request");

        let reply = self.service.complete(&self.system_prompt, &input).await?;
        self.history.append(MessageKind::Assistant, &reply);
        self.last_response = Some(reply.clone());
        Ok(reply)
    }

    pub fn record_command_output(&mut self, output: &str) {
        self.history.append(MessageKind::CommandOutput, output);
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn ghost_mode(&self) -> bool {
        self.ghost_mode
    }

    pub fn set_ghost_mode(&mut self, enabled: bool) {
        self.ghost_mode = enabled;
    }
}
