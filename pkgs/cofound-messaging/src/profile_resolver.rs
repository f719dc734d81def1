//! Profile resolver - which participant slot is the local user
//!
//! The session may supply the local profile id up front; that value is
//! authoritative. Without it, the id is derived from the first direct
//! conversation that names its counterpart and has both participant slots
//! populated, then cached for the rest of the session.

use tracing::info;

use crate::models::{Conversation, Message, TEMP_PARTICIPANT};

/// How the local identity became known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Session,
    Derived,
}

#[derive(Debug, Default)]
pub struct ProfileResolver {
    identity: Option<(String, IdentitySource)>,
}

impl ProfileResolver {
    pub fn new(session_identity: Option<String>) -> Self {
        Self {
            identity: session_identity
                .filter(|id| !id.is_empty())
                .map(|id| (id, IdentitySource::Session)),
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn source(&self) -> Option<IdentitySource> {
        self.identity.as_ref().map(|(_, source)| *source)
    }

    /// Try to derive the identity from loaded conversations.
    /// A no-op once an identity is known.
    pub fn observe(&mut self, conversations: &[Conversation]) -> Option<&str> {
        if self.identity.is_none() {
            if let Some(me) = conversations.iter().find_map(derive_identity) {
                info!(profile_id = %me, "Resolved local profile from conversations");
                self.identity = Some((me, IdentitySource::Derived));
            }
        }
        self.identity()
    }

    /// Whether `message` was sent by the local user.
    ///
    /// Without a known identity a direct conversation falls back to "not
    /// sent by the counterpart"; group messages are then never attributed
    /// to the local user.
    pub fn is_own(&self, message: &Message, conversation: &Conversation) -> bool {
        if let Some(me) = self.identity() {
            return message.sender_id == me;
        }
        if conversation.is_group() {
            return false;
        }
        match conversation.other_profile_id() {
            Some(other) => message.sender_id != other,
            None => false,
        }
    }
}

fn derive_identity(conversation: &Conversation) -> Option<String> {
    if conversation.is_group() || conversation.is_temporary() {
        return None;
    }
    let other = conversation.other_profile_id()?;
    let unknown = |slot: &str| slot.is_empty() || slot == TEMP_PARTICIPANT;
    if unknown(&conversation.profile_1_id) || unknown(&conversation.profile_2_id) {
        return None;
    }
    let me = if conversation.profile_1_id == other {
        &conversation.profile_2_id
    } else {
        &conversation.profile_1_id
    };
    Some(me.clone())
}
