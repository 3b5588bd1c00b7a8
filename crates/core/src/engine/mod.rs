//! Per-session conversation state machine.

pub mod engine;
pub mod prompts;
pub mod store;
pub mod validate;

use serde::{Deserialize, Serialize};

pub use engine::ConversationEngine;
pub use store::{InMemorySessionStore, SessionStore};

/// One inbound user utterance, as the transport adapter hands it over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Inbound {
    Text(String),
    /// Identifier of a selected button option.
    Option(String),
    /// A shared location pin.
    Location { lat: f64, lon: f64 },
}

/// One outbound prompt for the transport adapter to deliver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    pub text: String,
    pub options: Vec<PromptOption>,
}

impl Outbound {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), options: Vec::new() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptOption {
    pub id: String,
    pub label: String,
}

impl PromptOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }
}
