//! Error types for the collaborator adapters.

use deskbot_core::error::DeskbotError;

/// Errors from the knowledge retriever.
///
/// All variants mean the same thing to the conversation core: retrieval is
/// unavailable and the request degrades to the not-found path. The variants
/// exist so logs can tell a dead backend from a slow one.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("retrieval backend unavailable: {0}")]
    Unavailable(String),
    #[error("retrieval request timed out")]
    Timeout,
    #[error("retrieval response malformed: {0}")]
    Decode(String),
}

/// Errors from the text generator.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
    #[error("generation request timed out")]
    Timeout,
    #[error("generation response malformed: {0}")]
    Decode(String),
}

impl From<RetrievalError> for DeskbotError {
    fn from(err: RetrievalError) -> Self {
        DeskbotError::Retrieval(err.to_string())
    }
}

impl From<GenerationError> for DeskbotError {
    fn from(err: GenerationError) -> Self {
        DeskbotError::Generation(err.to_string())
    }
}
