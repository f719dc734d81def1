//! Events emitted by the messenger for a UI to render

/// Unified messenger event
#[derive(Debug, Clone, PartialEq)]
pub enum MessengerEvent {
    // Conversation list events
    ConversationsUpdated {
        count: usize,
    },
    MatchesUpdated {
        available: usize,
    },

    // Selection events
    SelectionChanged {
        conversation_id: Option<String>,
    },
    MessagesLoaded {
        conversation_id: String,
        count: usize,
    },

    // Composer events
    MessageSent {
        conversation_id: String,
        message_id: String,
    },
    ConversationPromoted {
        temp_id: String,
        conversation_id: String,
    },
    SendFailed {
        conversation_id: String,
        error: String,
    },

    /// Transient, user-visible notification
    Notice(String),
}
