//! Conversation log: the expiring per-session message store and the
//! reconstruction of generation history from it.

pub mod history;
pub mod store;

pub use history::{HISTORY_PLACEHOLDER_INSTRUCTION, build_history};
pub use store::ConversationStore;
