//! # Aisha Core
//!
//! Domain types, traits, and error definitions for the Aisha chat service.
//! This crate has **no web or HTTP dependencies**. It defines the seams that
//! the other crates implement against:
//!
//! - [`Provider`] — the hosted text-generation model
//! - [`LanguageDetector`] — classifies the user's message language
//! - [`Clock`] — the time source behind history expiry
//! - [`Persona`] — the fixed preamble and turn labels

pub mod clock;
pub mod error;
pub mod language;
pub mod persona;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DetectionError, ProviderError};
pub use language::{FixedLanguage, LanguageCode, LanguageDetector};
pub use persona::{Persona, PersonaPaths};
pub use provider::{GenerationParams, GenerationRequest, GenerationResponse, Provider, Usage};
