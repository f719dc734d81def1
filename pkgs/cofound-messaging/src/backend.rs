//! Contract with the remote messaging backend

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Conversation, GroupConversation, MatchSummary, Message};

/// Operations the messaging core consumes from the backend.
///
/// Implementations return fully ingested records; ordering of returned
/// lists is not guaranteed and callers must not rely on it.
#[async_trait]
pub trait MessagingBackend: Send + Sync {
    /// Direct conversations with their latest-message preview
    async fn list_direct_conversations(&self) -> Result<Vec<Conversation>>;

    /// Group conversations (participants, title, description, creator, project)
    async fn list_group_conversations(&self) -> Result<Vec<GroupConversation>>;

    /// Message history of one conversation, in unspecified order
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// Send a direct message. Keyed by match id because a temporary
    /// conversation has no real conversation id yet. The returned message
    /// carries the real conversation id.
    async fn send_direct_message(&self, match_id: &str, text: &str) -> Result<Message>;

    /// Send a message into an existing group conversation
    async fn send_group_message(&self, conversation_id: &str, text: &str) -> Result<Message>;

    /// Acknowledge that a conversation has been read
    async fn mark_conversation_read(&self, conversation_id: &str) -> Result<()>;

    /// Mutual matches, including those without a conversation yet
    async fn list_mutual_matches(&self) -> Result<Vec<MatchSummary>>;

    /// Single match detail, used to seed a temporary conversation
    async fn get_match(&self, match_id: &str) -> Result<MatchSummary>;
}
