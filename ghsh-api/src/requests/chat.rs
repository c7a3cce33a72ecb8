use crate::common::ChatMessage;
use crate::common::Role;
use serde_json::Value;
use serde_json::json;

/// Assembled Chat Completions request body.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub body: Value,
}

pub struct ChatRequestBuilder<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a [ChatMessage],
}

impl<'a> ChatRequestBuilder<'a> {
    pub fn new(model: &'a str, instructions: &'a str, input: &'a [ChatMessage]) -> Self {
        Self {
            model,
            instructions,
            input,
        }
    }

    /// The system instructions always lead the message list; `input` follows
    /// in order.
    pub fn build(self) -> ChatRequest {
        let mut messages = Vec::<Value>::with_capacity(self.input.len() + 1);
        messages.push(json!({"role": Role::System, "content": self.instructions}));
        for message in self.input {
            messages.push(json!({"role": message.role, "content": message.content}));
        }

        ChatRequest {
            body: json!({
                "model": self.model,
                "messages": messages,
            }),
        }
    }
}
