mod history;

pub use history::ConversationHistory;
pub use history::HistoryItem;
pub use history::MessageKind;
