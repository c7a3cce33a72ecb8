use std::collections::VecDeque;

use ghsh_api::ChatMessage;
use ghsh_api::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Assistant,
    /// Captured output of a command the assistant suggested.
    CommandOutput,
}

impl MessageKind {
    /// Command output is presented to the model as user text.
    pub fn role(self) -> Role {
        match self {
            MessageKind::User | MessageKind::CommandOutput => Role::User,
            MessageKind::Assistant => Role::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub kind: MessageKind,
    pub content: String,
}

/// Bounded transcript of the AI conversation. The system instructions are
/// never stored here; they are added when a request is built.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    /// The oldest items are at the front.
    items: VecDeque<HistoryItem>,
    max_messages: usize,
    max_message_bytes: usize,
}

impl ConversationHistory {
    pub fn new(max_messages: usize, max_message_bytes: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(max_messages.saturating_add(1)),
            max_messages,
            max_message_bytes,
        }
    }

    /// Truncates `text` to the per-message cap and enqueues it, evicting the
    /// oldest entries once the count ceiling is exceeded.
    pub fn append(&mut self, kind: MessageKind, text: &str) {
        let content = truncate_to_char_boundary(text, self.max_message_bytes).to_string();
        self.items.push_back(HistoryItem { kind, content });
        while self.items.len() > self.max_messages {
            self.items.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    /// History in arrival order, ready to follow the system message of a
    /// chat request.
    pub fn for_prompt(&self) -> Vec<ChatMessage> {
        self.items
            .iter()
            .map(|item| ChatMessage::new(item.kind.role(), item.content.clone()))
            .collect()
    }
}

/// Longest prefix of `text` that is at most `max_bytes` long and ends on a
/// UTF-8 character boundary.
fn truncate_to_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
