//! The chat pipeline — the heart of Aisha.
//!
//! Every request follows one straight path:
//!
//! 1. **Detect** the language of the user's message
//! 2. **Compose** the prompt: persona + recent history + new turn + response prefix
//! 3. **Generate** the reply via the configured provider
//! 4. **Record** the turn in the history cache (only on success)
//!
//! Failures never retry and never touch the cache.

pub mod chat;
pub mod language;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use chat::{ChatError, ChatService, EMPTY_MESSAGE_DETAIL, GENERIC_FAILURE_DETAIL};
pub use language::WhatlangDetector;
pub use prompt::{compose, detect_language};
