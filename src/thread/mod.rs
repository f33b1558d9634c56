mod history;
mod quote;

pub use history::{ConversationHistory, HistoryEntry, HistoryEvent, HistoryOptions, HistoryState};
pub use quote::QuoteNavigator;
