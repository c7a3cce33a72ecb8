//! Shell runtime for ghsh: sessions, built-ins, pipeline execution and the
//! AI command loop.

pub mod builtins;
pub mod config;
mod context_manager;
pub mod error;
pub mod ghost;
pub mod history_log;
pub mod pipeline;
pub mod prompt;
mod session;

pub use builtins::Builtin;
pub use builtins::source_file;
pub use builtins::source_startup_files;
pub use context_manager::ConversationHistory;
pub use context_manager::HistoryItem;
pub use context_manager::MessageKind;
pub use session::Session;

/// Printed when an interactive session starts.
pub fn banner() -> String {
    format!(
        "Ghost Shell v{}\nType 'help' for a list of built-in commands.",
        env!("CARGO_PKG_VERSION")
    )
}
