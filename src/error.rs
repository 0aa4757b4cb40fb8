//! Error types for chat session management

use thiserror::Error;

/// Result type for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors raised while building or mutating chats and messages
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Invalid role '{0}', expected one of: user, system, assistant")]
    InvalidRole(String),

    #[error("Invalid content, message content must not be empty")]
    InvalidContent,

    #[error("Invalid created_at, a message cannot be created at the zero instant")]
    InvalidTimestamp,

    #[error("Invalid user_id, a chat requires a non-empty user id")]
    InvalidUserId,

    #[error("Invalid status '{0}', expected one of: active, ended")]
    InvalidStatus(String),

    #[error("Invalid temperature {0}, must be between 0 and 2")]
    InvalidTemperature(f32),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Message {0} is already part of this chat")]
    DuplicateMessage(String),

    #[error("Chat is ended, no more messages allowed")]
    SessionEnded,

    #[error("Message exceeds context window: {tokens} tokens, model allows {max}")]
    MessageExceedsContext { tokens: usize, max: usize },

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),
}

impl ChatError {
    /// Short, stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::InvalidRole(_) => "invalid_role",
            ChatError::InvalidContent => "invalid_content",
            ChatError::InvalidTimestamp => "invalid_timestamp",
            ChatError::InvalidUserId => "invalid_user_id",
            ChatError::InvalidStatus(_) => "invalid_status",
            ChatError::InvalidTemperature(_) => "invalid_temperature",
            ChatError::InvalidModel(_) => "invalid_model",
            ChatError::DuplicateMessage(_) => "duplicate_message",
            ChatError::SessionEnded => "session_ended",
            ChatError::MessageExceedsContext { .. } => "exceeds_context",
            ChatError::Tokenizer(_) => "tokenizer",
            ChatError::Configuration(_) | ChatError::ConfigLoad(_) => "configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ChatError::MessageExceedsContext { tokens: 150, max: 100 };
        assert_eq!(
            err.to_string(),
            "Message exceeds context window: 150 tokens, model allows 100"
        );
        assert!(ChatError::InvalidRole("bot".to_string()).to_string().contains("bot"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(ChatError::SessionEnded.kind(), "session_ended");
        assert_eq!(ChatError::InvalidContent.kind(), "invalid_content");
        assert_eq!(
            ChatError::MessageExceedsContext { tokens: 1, max: 0 }.kind(),
            "exceeds_context"
        );
    }
}
