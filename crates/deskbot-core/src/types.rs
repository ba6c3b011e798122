//! Domain types shared across the Deskbot crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message within a session's ordered history.
///
/// Immutable once appended; insertion order is the conversation order and is
/// replayed as history to the policy engine and the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a user turn stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant turn stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A labeled snippet of reference material returned by retrieval for one
/// question. Produced per-request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The option or system the snippet pertains to (e.g. "Webmail",
    /// "Outlook"). Distinct labels are what the clarify rule counts.
    pub label: String,
    /// The reference text itself.
    pub snippet: String,
    /// Relevance similarity assigned by the retriever, 0.0 to 1.0. Passed
    /// through; the policy engine does not recompute relevance.
    pub score: f32,
}

impl Candidate {
    pub fn new(label: impl Into<String>, snippet: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            snippet: snippet.into(),
            score,
        }
    }
}

/// Coarse intent of a user query, classified before retrieval.
///
/// Greetings and farewells are answerable without reference material; every
/// other query flows through retrieval and the clarify-or-answer rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Question,
}
