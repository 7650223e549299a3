//! Conversational interface for Cambium.
//!
//! Provides the session transcript, the session-keyed store, and the chat
//! engine that condenses follow-up questions, retrieves document context,
//! and generates LLM-backed replies.

pub mod engine;
pub mod error;
pub mod store;
pub mod transcript;

pub use engine::ChatEngine;
pub use error::ChatError;
pub use store::{SessionStore, SessionSummary};
pub use transcript::Transcript;
