//! Conversation store - the session's in-memory view of all conversations
//!
//! Holds direct and group conversations merged into one list, ordered by
//! most recent activity. Every mutation goes through the operations below;
//! all of them are keyed by conversation id so that a background refresh
//! and a user action can land in either order without duplicating entries.
//!
//! # Reconciliation
//!
//! A refresh does not blindly replace the list:
//!
//! - fetched entries are upserted, keeping a local preview that is newer
//!   than the fetched one (an optimistic send the fetch did not see yet)
//! - local entries missing from the fetch are dropped, except conversations
//!   promoted locally that no fetch has confirmed yet

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info};

use crate::models::{Conversation, GroupConversation, Message};

/// Conversation lists fetched ahead of the messaging view
#[derive(Debug, Clone, Default)]
pub struct PrefetchedConversations {
    pub direct: Vec<Conversation>,
    pub group: Vec<GroupConversation>,
}

/// In-memory conversation store
#[derive(Debug, Default)]
pub struct ConversationStore {
    /// Ordered by descending last activity
    conversations: Vec<Conversation>,
    /// Locally promoted conversations not yet seen in a fetch
    unconfirmed: HashSet<String>,
    prefetched: Option<PrefetchedConversations>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge direct and group listings into one display-ordered list.
    ///
    /// Direct entries are deduplicated by match id, every entry by
    /// conversation id. The sort is stable, so merging the same input twice
    /// yields the same order.
    pub fn merge(direct: Vec<Conversation>, group: Vec<GroupConversation>) -> Vec<Conversation> {
        let mut seen_ids = HashSet::new();
        let mut seen_matches = HashSet::new();
        let mut all = Vec::with_capacity(direct.len() + group.len());

        for conv in direct {
            if seen_ids.contains(&conv.id) {
                continue;
            }
            if !conv.match_id.is_empty() && !seen_matches.insert(conv.match_id.clone()) {
                debug!(
                    conversation_id = %conv.id,
                    match_id = %conv.match_id,
                    "Skipping second conversation for the same match"
                );
                continue;
            }
            seen_ids.insert(conv.id.clone());
            all.push(conv);
        }

        for group_conv in group {
            if seen_ids.insert(group_conv.id.clone()) {
                all.push(group_conv.into_conversation());
            }
        }

        sort_by_activity(&mut all);
        all
    }

    /// Replace the whole list, dropping any local-only state
    pub fn replace(&mut self, conversations: Vec<Conversation>) {
        self.unconfirmed.clear();
        self.conversations = conversations;
        sort_by_activity(&mut self.conversations);
    }

    /// Merge a fetched list into the store (see module docs)
    pub fn reconcile(&mut self, fetched: Vec<Conversation>) {
        let mut next = Vec::with_capacity(fetched.len() + self.unconfirmed.len());

        for mut remote in fetched {
            if let Some(local) = self.get(&remote.id) {
                if local.activity_millis() > remote.activity_millis() {
                    remote.last_message_at = local.last_message_at;
                    remote.preview = local.preview.clone();
                }
            }
            self.unconfirmed.remove(&remote.id);
            next.push(remote);
        }

        for local in &self.conversations {
            if self.unconfirmed.contains(&local.id) && !next.iter().any(|c| c.id == local.id) {
                next.push(local.clone());
            }
        }

        sort_by_activity(&mut next);
        self.conversations = next;
        debug!(count = self.conversations.len(), "Conversation store reconciled");
    }

    /// Insert or replace a single conversation by id
    pub fn upsert(&mut self, conversation: Conversation) {
        match self.position(&conversation.id) {
            Some(index) => self.conversations[index] = conversation,
            None => self.conversations.push(conversation),
        }
        sort_by_activity(&mut self.conversations);
    }

    /// Reset the unread counter. Returns false if the id is unknown.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) => {
                self.conversations[index].unread_count = 0;
                true
            }
            None => false,
        }
    }

    /// Update preview and activity after a message was sent into an
    /// existing conversation. Returns false if the id is unknown.
    pub fn record_sent(&mut self, conversation_id: &str, message: &Message) -> bool {
        let Some(index) = self.position(conversation_id) else {
            return false;
        };
        let conv = &mut self.conversations[index];
        conv.last_message_at = Some(message.created_at.unwrap_or_else(Utc::now));
        conv.preview = Some(message.clone());
        sort_by_activity(&mut self.conversations);
        true
    }

    /// Replace a temporary conversation with its confirmed counterpart.
    ///
    /// If a refresh already inserted an entry with the real id, that entry
    /// is updated in place instead of adding a second one.
    pub fn promote(&mut self, temp_id: &str, promoted: Conversation, message: &Message) {
        self.conversations.retain(|c| c.id != temp_id);

        if self.record_sent(&promoted.id, message) {
            debug!(conversation_id = %promoted.id, "Promoted conversation already present");
            return;
        }

        info!(
            temp_id = %temp_id,
            conversation_id = %promoted.id,
            "Temporary conversation promoted"
        );
        self.unconfirmed.insert(promoted.id.clone());
        self.conversations.push(promoted);
        sort_by_activity(&mut self.conversations);
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Direct conversation tied to a match
    pub fn find_by_match(&self, match_id: &str) -> Option<&Conversation> {
        if match_id.is_empty() {
            return None;
        }
        self.conversations
            .iter()
            .find(|c| !c.is_group() && c.match_id == match_id)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Park prefetched listings for the next load
    pub fn stash_prefetched(&mut self, prefetched: PrefetchedConversations) {
        self.prefetched = Some(prefetched);
    }

    /// Take the prefetched listings, leaving the slot empty
    pub fn take_prefetched(&mut self) -> Option<PrefetchedConversations> {
        self.prefetched.take()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }
}

fn sort_by_activity(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.activity_millis().cmp(&a.activity_millis()));
}
