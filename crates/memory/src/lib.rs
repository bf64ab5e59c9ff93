//! Conversation memory for Aisha.
//!
//! Only short-term, process-lifetime history lives here. Nothing is
//! persisted across restarts.

pub mod history;

pub use history::{HistoryCache, HistoryEntry, DEFAULT_TTL};
