//! Error types for the conversation core.

use deskbot_core::error::DeskbotError;

/// Errors from the conversation core.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<ChatError> for DeskbotError {
    fn from(err: ChatError) -> Self {
        DeskbotError::Chat(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::EmptyMessage.to_string(),
            "message cannot be empty"
        );
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::InvalidSessionId("contains '/'".to_string()).to_string(),
            "invalid session id: contains '/'"
        );
        assert_eq!(
            ChatError::SessionNotFound("abc".to_string()).to_string(),
            "session not found: abc"
        );
        assert_eq!(
            ChatError::StorageError("lock poisoned".to_string()).to_string(),
            "storage error: lock poisoned"
        );
    }

    #[test]
    fn test_conversion_to_deskbot_error() {
        let err: DeskbotError = ChatError::EmptyMessage.into();
        assert!(matches!(err, DeskbotError::Chat(_)));
        assert!(err.to_string().contains("message cannot be empty"));
    }
}
