//! Error types for messaging operations

use thiserror::Error;

/// Errors that can occur while talking to the messaging backend or
/// driving local conversation state
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Backend returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
    #[error("Match not found: {0}")]
    MatchNotFound(String),
    #[error("No conversation selected")]
    NoSelection,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MessagingError>;
