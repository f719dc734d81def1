//! Backend payload records
//!
//! Every field the backend may omit is optional here. Defaults are applied
//! once, in the `into_*` conversions, so the rest of the crate works with
//! the fully populated types from [`crate::models`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::models::{
    Conversation, ConversationKind, GroupConversation, MatchSummary, Message, Participant,
    ParticipantRole, ProfileSummary,
};

/// Parse a backend timestamp. Accepts RFC 3339 and naive ISO-8601 (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_timestamp)
}

/// Read an explicit `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireProfile {
    pub profile_id: Option<String>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub current_role: Option<String>,
    pub photo_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub photo_urls: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub photos: Vec<String>,
}

impl WireProfile {
    pub fn into_profile(self) -> ProfileSummary {
        let photo_url = non_empty(self.photo_url)
            .or_else(|| self.photo_urls.into_iter().next())
            .or_else(|| self.photos.into_iter().next());

        ProfileSummary {
            profile_id: non_empty(self.profile_id),
            user_id: non_empty(self.user_id),
            name: non_empty(self.name),
            current_role: non_empty(self.current_role),
            photo_url,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireParticipant {
    pub profile_id: Option<String>,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub current_role: Option<String>,
    pub role: Option<String>,
}

impl WireParticipant {
    pub fn into_participant(self, created_by: Option<&str>) -> Option<Participant> {
        let profile_id = non_empty(self.profile_id)?;
        let flagged = matches!(
            self.role.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("creator") | Some("admin") | Some("owner")
        );
        let role = if flagged || created_by == Some(profile_id.as_str()) {
            ParticipantRole::Creator
        } else {
            ParticipantRole::Member
        };

        Some(Participant {
            profile_id,
            name: non_empty(self.name),
            photo_url: non_empty(self.photo_url),
            current_role: non_empty(self.current_role),
            role,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireMessage {
    pub message_id: Option<String>,
    pub conversation_id: Option<String>,
    pub sender_profile_id: Option<String>,
    pub message_text: Option<String>,
    pub created_at: Option<String>,
}

impl WireMessage {
    pub fn into_message(self) -> Option<Message> {
        let Some(id) = non_empty(self.message_id) else {
            warn!("Dropping message payload without message_id");
            return None;
        };

        Some(Message {
            id,
            conversation_id: non_empty(self.conversation_id),
            sender_id: self.sender_profile_id.unwrap_or_default(),
            body: self.message_text.unwrap_or_default(),
            created_at: timestamp(self.created_at.as_deref()),
        })
    }
}

/// Conversation record, shared by the direct and group listings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireConversation {
    pub conversation_id: Option<String>,
    pub match_id: Option<String>,
    pub profile_1_id: Option<String>,
    pub profile_2_id: Option<String>,
    pub last_message_at: Option<String>,
    pub created_at: Option<String>,
    pub unread_count: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub messages: Vec<WireMessage>,
    pub other_profile: Option<WireProfile>,
    pub project_id: Option<String>,
    pub title: Option<String>,
    pub created_by: Option<String>,
    pub project_description: Option<String>,
    pub participant_count: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub participants: Vec<WireParticipant>,
}

impl WireConversation {
    fn unread(&self) -> u32 {
        self.unread_count
            .map(|n| n.clamp(0, u32::MAX as i64) as u32)
            .unwrap_or(0)
    }

    fn preview(messages: Vec<WireMessage>) -> Option<Message> {
        messages
            .into_iter()
            .next()
            .and_then(WireMessage::into_message)
    }

    pub fn into_direct(self) -> Option<Conversation> {
        let Some(id) = non_empty(self.conversation_id.clone()) else {
            warn!("Dropping direct conversation payload without conversation_id");
            return None;
        };
        let unread_count = self.unread();

        Some(Conversation {
            id,
            kind: ConversationKind::Direct,
            match_id: self.match_id.unwrap_or_default(),
            profile_1_id: self.profile_1_id.unwrap_or_default(),
            profile_2_id: self.profile_2_id.unwrap_or_default(),
            other_profile: self.other_profile.map(WireProfile::into_profile),
            last_message_at: timestamp(self.last_message_at.as_deref()),
            created_at: timestamp(self.created_at.as_deref()),
            unread_count,
            preview: Self::preview(self.messages),
            group: None,
        })
    }

    pub fn into_group(self) -> Option<GroupConversation> {
        let Some(id) = non_empty(self.conversation_id.clone()) else {
            warn!("Dropping group conversation payload without conversation_id");
            return None;
        };
        let unread_count = self.unread();
        let created_by = non_empty(self.created_by);
        let participants = self
            .participants
            .into_iter()
            .filter_map(|p| p.into_participant(created_by.as_deref()))
            .collect();

        Some(GroupConversation {
            id,
            match_id: non_empty(self.match_id),
            project_id: non_empty(self.project_id),
            title: non_empty(self.title),
            description: non_empty(self.project_description),
            created_by,
            participants,
            participant_count: self.participant_count.map(|n| n as usize),
            last_message_at: timestamp(self.last_message_at.as_deref()),
            created_at: timestamp(self.created_at.as_deref()),
            unread_count,
            preview: Self::preview(self.messages),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireConversationList {
    #[serde(deserialize_with = "null_as_default")]
    pub conversations: Vec<WireConversation>,
}

/// Group listings arrive either bare or wrapped in `{"conversations": [...]}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireGroupList {
    Bare(Vec<WireConversation>),
    Wrapped(WireConversationList),
}

impl WireGroupList {
    pub fn into_groups(self) -> Vec<GroupConversation> {
        let records = match self {
            Self::Bare(records) => records,
            Self::Wrapped(list) => list.conversations,
        };
        records
            .into_iter()
            .filter_map(WireConversation::into_group)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireMessageList {
    #[serde(deserialize_with = "null_as_default")]
    pub messages: Vec<WireMessage>,
}

/// Message history arrives either bare or wrapped in `{"messages": [...]}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireMessages {
    Bare(Vec<WireMessage>),
    Wrapped(WireMessageList),
}

impl WireMessages {
    pub fn into_messages(self) -> Vec<Message> {
        let records = match self {
            Self::Bare(records) => records,
            Self::Wrapped(list) => list.messages,
        };
        records
            .into_iter()
            .filter_map(WireMessage::into_message)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireMatch {
    pub match_id: Option<String>,
    pub matched_profile: Option<WireProfile>,
}

impl WireMatch {
    pub fn into_match(self) -> Option<MatchSummary> {
        let match_id = non_empty(self.match_id)?;
        Some(MatchSummary {
            match_id,
            profile: self.matched_profile.map(WireProfile::into_profile),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireMutualMatches {
    #[serde(deserialize_with = "null_as_default")]
    pub mutual_matches: Vec<WireMatch>,
}

/// Body for both send endpoints
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub text: &'a str,
}
