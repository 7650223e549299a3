//! Error types for the conversational interface.

use cambium_core::error::CambiumError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("a reply is already being generated for session {0}")]
    ReplyPending(uuid::Uuid),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CambiumError> for ChatError {
    fn from(err: CambiumError) -> Self {
        match err {
            // Any failure of the reply call chain (condense, query embedding,
            // completion) is a recoverable generation failure.
            CambiumError::Generation(msg) => ChatError::Generation(msg),
            CambiumError::Api(msg) => ChatError::Generation(msg),
            other => ChatError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::EmptyMessage;
        assert_eq!(err.to_string(), "message cannot be empty");

        let err = ChatError::MessageTooLong(2000);
        assert_eq!(
            err.to_string(),
            "message exceeds maximum length of 2000 characters"
        );

        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let err = ChatError::SessionNotFound(id);
        assert_eq!(
            err.to_string(),
            "session not found: 550e8400-e29b-41d4-a716-446655440000"
        );

        let err = ChatError::Generation("model timed out".to_string());
        assert_eq!(err.to_string(), "generation failed: model timed out");
    }

    #[test]
    fn test_from_generation_error() {
        let err: ChatError = CambiumError::Generation("completion failed".to_string()).into();
        assert!(matches!(err, ChatError::Generation(_)));
        assert!(err.to_string().contains("completion failed"));
    }

    #[test]
    fn test_from_api_error_is_generation() {
        let err: ChatError = CambiumError::Api("connection refused".to_string()).into();
        assert!(matches!(err, ChatError::Generation(_)));
    }

    #[test]
    fn test_from_other_error_is_internal() {
        let err: ChatError = CambiumError::Config("missing key".to_string()).into();
        assert!(matches!(err, ChatError::Internal(_)));
        assert!(err.to_string().contains("missing key"));
    }

    #[test]
    fn test_reply_pending_preserves_uuid() {
        let id = Uuid::nil();
        let err = ChatError::ReplyPending(id);
        assert!(err
            .to_string()
            .contains("00000000-0000-0000-0000-000000000000"));
    }
}
