//! Scripted in-memory backend shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use cofound_messaging::{
    Conversation, ConversationKind, GroupConversation, MatchSummary, Message, MessagingBackend,
    MessagingError, Participant, ParticipantRole, ProfileSummary, Result,
};
use futures::channel::mpsc;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Profile id of the local user in every fixture
pub const ME: &str = "p-me";

#[derive(Default)]
struct MockState {
    direct: Vec<Conversation>,
    groups: Vec<GroupConversation>,
    messages: HashMap<String, Vec<Message>>,
    matches: Vec<MatchSummary>,
    /// conversation id the backend assigns on the first send per match
    assigned_ids: HashMap<String, String>,
    /// timestamp stamped on the next sent message
    send_time: Option<DateTime<Utc>>,
    fail_direct: bool,
    fail_group: bool,
    fail_send: bool,
    fail_messages: bool,
    fail_mark_read: bool,
    calls: Vec<String>,
}

#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    send_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_direct(&self, conversation: Conversation) {
        self.state.lock().direct.push(conversation);
    }

    pub fn add_group(&self, group: GroupConversation) {
        self.state.lock().groups.push(group);
    }

    pub fn add_match(&self, candidate: MatchSummary) {
        self.state.lock().matches.push(candidate);
    }

    pub fn set_messages(&self, conversation_id: &str, messages: Vec<Message>) {
        self.state
            .lock()
            .messages
            .insert(conversation_id.to_string(), messages);
    }

    pub fn remove_direct(&self, conversation_id: &str) {
        self.state.lock().direct.retain(|c| c.id != conversation_id);
    }

    pub fn remove_group(&self, conversation_id: &str) {
        self.state.lock().groups.retain(|g| g.id != conversation_id);
    }

    /// Conversation id to hand out when a first message is sent to `match_id`
    pub fn assign_conversation_id(&self, match_id: &str, conversation_id: &str) {
        self.state
            .lock()
            .assigned_ids
            .insert(match_id.to_string(), conversation_id.to_string());
    }

    pub fn set_send_time(&self, at: DateTime<Utc>) {
        self.state.lock().send_time = Some(at);
    }

    pub fn fail_direct(&self, fail: bool) {
        self.state.lock().fail_direct = fail;
    }

    pub fn fail_group(&self, fail: bool) {
        self.state.lock().fail_group = fail;
    }

    pub fn fail_send(&self, fail: bool) {
        self.state.lock().fail_send = fail;
    }

    pub fn fail_messages(&self, fail: bool) {
        self.state.lock().fail_messages = fail;
    }

    pub fn fail_mark_read(&self, fail: bool) {
        self.state.lock().fail_mark_read = fail;
    }

    /// Hold every send response until the returned notify fires. The send
    /// is applied on the backend side before the hold.
    pub fn hold_sends(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.send_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn stored_messages(&self, conversation_id: &str) -> Vec<Message> {
        self.state
            .lock()
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: String) {
        self.state.lock().calls.push(call);
    }

    fn offline() -> MessagingError {
        MessagingError::Network("backend unreachable".to_string())
    }

    async fn wait_for_gate(&self) {
        let gate = self.send_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl MessagingBackend for MockBackend {
    async fn list_direct_conversations(&self) -> Result<Vec<Conversation>> {
        self.record("list_direct".to_string());
        let state = self.state.lock();
        if state.fail_direct {
            return Err(Self::offline());
        }
        Ok(state.direct.clone())
    }

    async fn list_group_conversations(&self) -> Result<Vec<GroupConversation>> {
        self.record("list_group".to_string());
        let state = self.state.lock();
        if state.fail_group {
            return Err(Self::offline());
        }
        Ok(state.groups.clone())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.record(format!("list_messages:{conversation_id}"));
        let state = self.state.lock();
        if state.fail_messages {
            return Err(Self::offline());
        }
        Ok(state
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_direct_message(&self, match_id: &str, text: &str) -> Result<Message> {
        self.record(format!("send_direct:{match_id}"));
        let message = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            if state.fail_send {
                return Err(Self::offline());
            }
            let created_at = state.send_time.unwrap_or_else(Utc::now);

            let existing = state
                .direct
                .iter()
                .position(|c| c.match_id == match_id);
            let index = match existing {
                Some(index) => index,
                None => {
                    let id = state
                        .assigned_ids
                        .get(match_id)
                        .cloned()
                        .unwrap_or_else(|| format!("c-{match_id}"));
                    let other = state
                        .matches
                        .iter()
                        .find(|m| m.match_id == match_id)
                        .and_then(|m| m.profile.clone());
                    let mut conversation = direct(&id, match_id, None);
                    conversation.other_profile = other.or(conversation.other_profile);
                    state.direct.push(conversation);
                    state.direct.len() - 1
                }
            };

            let conversation = &mut state.direct[index];
            let message = Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: Some(conversation.id.clone()),
                sender_id: ME.to_string(),
                body: text.to_string(),
                created_at: Some(created_at),
            };
            conversation.last_message_at = Some(created_at);
            conversation.preview = Some(message.clone());
            state
                .messages
                .entry(conversation.id.clone())
                .or_default()
                .push(message.clone());
            message
        };

        self.wait_for_gate().await;
        Ok(message)
    }

    async fn send_group_message(&self, conversation_id: &str, text: &str) -> Result<Message> {
        self.record(format!("send_group:{conversation_id}"));
        let message = {
            let mut state = self.state.lock();
            if state.fail_send {
                return Err(Self::offline());
            }
            let message = Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: Some(conversation_id.to_string()),
                sender_id: ME.to_string(),
                body: text.to_string(),
                created_at: Some(state.send_time.unwrap_or_else(Utc::now)),
            };
            state
                .messages
                .entry(conversation_id.to_string())
                .or_default()
                .push(message.clone());
            message
        };

        self.wait_for_gate().await;
        Ok(message)
    }

    async fn mark_conversation_read(&self, conversation_id: &str) -> Result<()> {
        self.record(format!("mark_read:{conversation_id}"));
        let mut state = self.state.lock();
        if state.fail_mark_read {
            return Err(Self::offline());
        }
        if let Some(conv) = state.direct.iter_mut().find(|c| c.id == conversation_id) {
            conv.unread_count = 0;
        }
        if let Some(group) = state.groups.iter_mut().find(|g| g.id == conversation_id) {
            group.unread_count = 0;
        }
        Ok(())
    }

    async fn list_mutual_matches(&self) -> Result<Vec<MatchSummary>> {
        self.record("list_matches".to_string());
        Ok(self.state.lock().matches.clone())
    }

    async fn get_match(&self, match_id: &str) -> Result<MatchSummary> {
        self.record(format!("get_match:{match_id}"));
        self.state
            .lock()
            .matches
            .iter()
            .find(|m| m.match_id == match_id)
            .cloned()
            .ok_or_else(|| MessagingError::MatchNotFound(match_id.to_string()))
    }
}

// ---- fixtures -------------------------------------------------------------

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
}

pub fn profile(profile_id: &str, user_id: &str, name: &str) -> ProfileSummary {
    ProfileSummary {
        profile_id: Some(profile_id.to_string()),
        user_id: Some(user_id.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

/// Direct conversation between [`ME`] and `p-<match_id>`
pub fn direct(id: &str, match_id: &str, last_message_at: Option<DateTime<Utc>>) -> Conversation {
    let other = format!("p-{match_id}");
    Conversation {
        id: id.to_string(),
        kind: ConversationKind::Direct,
        match_id: match_id.to_string(),
        profile_1_id: ME.to_string(),
        profile_2_id: other.clone(),
        other_profile: Some(profile(&other, &format!("u-{match_id}"), "Ada Lovelace")),
        last_message_at,
        created_at: last_message_at,
        unread_count: 0,
        preview: None,
        group: None,
    }
}

pub fn group(id: &str, title: &str, last_message_at: Option<DateTime<Utc>>) -> GroupConversation {
    GroupConversation {
        id: id.to_string(),
        title: Some(title.to_string()),
        created_by: Some(ME.to_string()),
        participants: vec![
            participant(ME, "Me Myself", ParticipantRole::Creator),
            participant("p-grace", "Grace Hopper", ParticipantRole::Member),
        ],
        last_message_at,
        created_at: last_message_at,
        ..Default::default()
    }
}

pub fn participant(profile_id: &str, name: &str, role: ParticipantRole) -> Participant {
    Participant {
        profile_id: profile_id.to_string(),
        name: Some(name.to_string()),
        photo_url: None,
        current_role: None,
        role,
    }
}

pub fn message(id: &str, conversation_id: &str, sender: &str, at: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: Some(conversation_id.to_string()),
        sender_id: sender.to_string(),
        body: format!("body of {id}"),
        created_at: Some(at),
    }
}

pub fn candidate(match_id: &str) -> MatchSummary {
    MatchSummary {
        match_id: match_id.to_string(),
        profile: Some(profile(
            &format!("p-{match_id}"),
            &format!("u-{match_id}"),
            "Grace Hopper",
        )),
    }
}

pub fn drain<T>(receiver: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
