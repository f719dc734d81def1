//! Selection controller - the active conversation and its visible history
//!
//! Selection changes are gated by conversation id, never by record
//! identity: handing in a fresh copy of the already selected conversation
//! only refreshes the record and does not ask for another history load.

use crate::models::{Conversation, Message};

/// Result of a selection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    /// Same conversation id as before (or nothing to clear)
    Unchanged,
    /// Back to the empty-state view
    Cleared,
    /// A different conversation became active
    Switched {
        conversation_id: String,
        load_history: bool,
        mark_read: bool,
    },
}

#[derive(Debug, Default)]
pub struct SelectionController {
    selected: Option<Conversation>,
    /// Oldest first
    messages: Vec<Message>,
    group_info_open: bool,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, conversation: Option<Conversation>) -> SelectionChange {
        let Some(conversation) = conversation else {
            if self.selected.take().is_none() {
                return SelectionChange::Unchanged;
            }
            self.reset_view();
            return SelectionChange::Cleared;
        };

        if self.selected_id() == Some(conversation.id.as_str()) {
            self.selected = Some(conversation);
            return SelectionChange::Unchanged;
        }

        let confirmed = !conversation.is_temporary();
        let conversation_id = conversation.id.clone();
        self.selected = Some(conversation);
        self.reset_view();

        SelectionChange::Switched {
            conversation_id,
            load_history: confirmed,
            mark_read: confirmed,
        }
    }

    pub fn selected(&self) -> Option<&Conversation> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|c| c.id.as_str())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message_id(&self) -> Option<&str> {
        self.messages.last().map(|m| m.id.as_str())
    }

    /// Install a loaded history. Ignored when the conversation is no longer
    /// selected, so a late response cannot overwrite another view.
    pub fn set_messages(&mut self, conversation_id: &str, mut messages: Vec<Message>) -> bool {
        if self.selected_id() != Some(conversation_id) {
            return false;
        }
        // Untimestamped messages go last, in the order the backend sent them.
        messages.sort_by_key(|m| (m.created_at.is_none(), m.created_at));
        self.messages = messages;
        true
    }

    /// Append a freshly sent message in send order. A message already in the
    /// history (say, from a reload that raced the send) is not duplicated.
    pub fn append_message(&mut self, conversation_id: &str, message: Message) -> bool {
        if self.selected_id() != Some(conversation_id) {
            return false;
        }
        if !self.messages.iter().any(|m| m.id == message.id) {
            self.messages.push(message);
        }
        true
    }

    /// Apply a refreshed copy of the selected conversation.
    ///
    /// Only the group roster and participant count are taken over; the
    /// visible history is kept. Returns true when the refreshed preview
    /// names a different latest message than the one held locally.
    pub fn apply_refresh(&mut self, refreshed: &Conversation) -> bool {
        let Some(selected) = self.selected.as_mut() else {
            return false;
        };
        if selected.id != refreshed.id {
            return false;
        }

        if let (Some(group), Some(fresh)) = (selected.group.as_mut(), refreshed.group.as_ref()) {
            group.participants = fresh.participants.clone();
            group.participant_count = fresh.participant_count;
        }

        let latest_remote = refreshed.preview.as_ref().map(|m| m.id.as_str());
        latest_remote != self.last_message_id()
    }

    /// Swap a selected temporary conversation for its confirmed counterpart,
    /// with the first message as its history
    pub fn promote(&mut self, temp_id: &str, promoted: Conversation, message: Message) -> bool {
        if self.selected_id() != Some(temp_id) {
            return false;
        }
        self.selected = Some(promoted);
        self.messages = vec![message];
        true
    }

    pub fn group_info_open(&self) -> bool {
        self.group_info_open
    }

    /// Toggle the group info panel; stays closed for direct conversations
    pub fn toggle_group_info(&mut self) -> bool {
        let is_group = self.selected.as_ref().is_some_and(|c| c.is_group());
        self.group_info_open = is_group && !self.group_info_open;
        self.group_info_open
    }

    fn reset_view(&mut self) {
        self.messages.clear();
        self.group_info_open = false;
    }
}
