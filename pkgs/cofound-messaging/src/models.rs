//! Conversation, message and match records shared by every component

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier prefix marking a conversation that only exists locally
pub const TEMP_CONVERSATION_PREFIX: &str = "temp_";

/// Placeholder written into both participant slots of a temporary conversation
pub const TEMP_PARTICIPANT: &str = "temp";

/// Returns true when `id` belongs to a locally created placeholder conversation
pub fn is_temporary_id(id: &str) -> bool {
    id.starts_with(TEMP_CONVERSATION_PREFIX)
}

/// Conversation kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    Direct,
    Group,
}

/// Lightweight profile embedded in conversations and matches
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileSummary {
    pub profile_id: Option<String>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub current_role: Option<String>,
    pub photo_url: Option<String>,
}

/// Participant role within a group conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Creator,
    Member,
}

/// Group participant, used for attribution and display only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub profile_id: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub current_role: Option<String>,
    pub role: ParticipantRole,
}

impl Participant {
    /// First word of the display name, if there is one
    pub fn first_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
    }
}

/// Message within a conversation. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub conversation_id: Option<String>,
    pub sender_id: String,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Group-only metadata carried on a merged conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupDetails {
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub project_id: Option<String>,
    pub participants: Vec<Participant>,
    pub participant_count: usize,
}

/// A conversation as shown in the conversation list.
///
/// Direct conversations are keyed to a mutual match through `match_id`;
/// group conversations leave it empty and carry [`GroupDetails`] instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub kind: ConversationKind,
    pub match_id: String,
    pub profile_1_id: String,
    pub profile_2_id: String,
    pub other_profile: Option<ProfileSummary>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub unread_count: u32,
    /// Most recent message, as embedded in the list payload
    pub preview: Option<Message>,
    pub group: Option<GroupDetails>,
}

impl Conversation {
    /// Build a placeholder for a match that has no conversation yet
    pub fn temporary(match_id: &str, other_profile: Option<ProfileSummary>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}{}", TEMP_CONVERSATION_PREFIX, now.timestamp_millis()),
            kind: ConversationKind::Direct,
            match_id: match_id.to_string(),
            profile_1_id: TEMP_PARTICIPANT.to_string(),
            profile_2_id: TEMP_PARTICIPANT.to_string(),
            other_profile,
            last_message_at: Some(now),
            created_at: Some(now),
            unread_count: 0,
            preview: None,
            group: None,
        }
    }

    pub fn is_temporary(&self) -> bool {
        is_temporary_id(&self.id)
    }

    pub fn is_group(&self) -> bool {
        self.kind == ConversationKind::Group
    }

    /// Profile id of the counterpart in a direct conversation
    pub fn other_profile_id(&self) -> Option<&str> {
        self.other_profile
            .as_ref()
            .and_then(|p| p.profile_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Sort key for the conversation list; a missing timestamp counts as the epoch
    pub fn activity_millis(&self) -> i64 {
        self.last_message_at
            .map(|at| at.timestamp_millis())
            .unwrap_or(0)
    }

    pub fn participants(&self) -> &[Participant] {
        self.group
            .as_ref()
            .map(|g| g.participants.as_slice())
            .unwrap_or(&[])
    }

    pub fn participant(&self, profile_id: &str) -> Option<&Participant> {
        self.participants()
            .iter()
            .find(|p| p.profile_id == profile_id)
    }
}

/// Group conversation as returned by the group listing, before it is
/// wrapped into the shared [`Conversation`] shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupConversation {
    pub id: String,
    pub match_id: Option<String>,
    pub project_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub participants: Vec<Participant>,
    pub participant_count: Option<usize>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub unread_count: u32,
    pub preview: Option<Message>,
}

impl GroupConversation {
    /// Wrap into the shared conversation shape. Last activity falls back to
    /// the creation time and the participant count to the roster length.
    pub fn into_conversation(self) -> Conversation {
        let participant_count = self
            .participant_count
            .filter(|count| *count > 0)
            .unwrap_or(self.participants.len());

        Conversation {
            id: self.id,
            kind: ConversationKind::Group,
            match_id: self.match_id.unwrap_or_default(),
            profile_1_id: String::new(),
            profile_2_id: String::new(),
            other_profile: None,
            last_message_at: self.last_message_at.or(self.created_at),
            created_at: self.created_at,
            unread_count: self.unread_count,
            preview: self.preview,
            group: Some(GroupDetails {
                title: self.title,
                description: self.description,
                created_by: self.created_by,
                project_id: self.project_id,
                participants: self.participants,
                participant_count,
            }),
        }
    }
}

/// A mutual match, eligible to start a direct conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSummary {
    pub match_id: String,
    pub profile: Option<ProfileSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_temporary_conversation_shape() {
        let conv = Conversation::temporary("m2", None);
        assert!(conv.is_temporary());
        assert_eq!(conv.match_id, "m2");
        assert_eq!(conv.profile_1_id, TEMP_PARTICIPANT);
        assert_eq!(conv.unread_count, 0);
        assert!(conv.preview.is_none());
    }

    #[test]
    fn test_group_wrap_falls_back_to_created_at() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let group = GroupConversation {
            id: "g1".to_string(),
            created_at: Some(created),
            participants: vec![Participant {
                profile_id: "p1".to_string(),
                name: Some("Ada Lovelace".to_string()),
                photo_url: None,
                current_role: None,
                role: ParticipantRole::Creator,
            }],
            ..Default::default()
        };

        let conv = group.into_conversation();
        assert!(conv.is_group());
        assert_eq!(conv.last_message_at, Some(created));
        assert_eq!(conv.group.as_ref().unwrap().participant_count, 1);
        assert_eq!(conv.participants()[0].first_name(), Some("Ada"));
    }

    #[test]
    fn test_missing_activity_sorts_as_epoch() {
        let mut conv = Conversation::temporary("m1", None);
        conv.last_message_at = None;
        assert_eq!(conv.activity_millis(), 0);
    }
}
