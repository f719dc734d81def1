//! Message composer - draft text and the per-send state machine
//!
//! `Idle -> Sending -> {Committed | Failed}`. The draft is cleared as soon
//! as a send starts and restored verbatim if the send fails. Only one send
//! may be outstanding; submits while `Sending` are ignored.

use tracing::{debug, warn};

use crate::models::Conversation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerState {
    #[default]
    Idle,
    Sending,
}

/// Which send endpoint a message goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendTarget {
    /// Keyed by match id; works for temporary conversations too
    Direct { match_id: String },
    Group { conversation_id: String },
}

/// A send that has left `Idle`
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub text: String,
    pub target: SendTarget,
    /// Snapshot of the conversation at submit time
    pub conversation: Conversation,
}

#[derive(Debug, Default)]
pub struct MessageComposer {
    draft: String,
    state: ComposerState,
}

impl MessageComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == ComposerState::Sending
    }

    /// Replace the draft. The input is disabled while sending, so edits
    /// during a send are rejected.
    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        if self.is_sending() {
            return false;
        }
        self.draft = text.into();
        true
    }

    /// `Idle -> Sending`. Returns `None` (and changes nothing) if a send is
    /// already outstanding, the draft is blank, or nothing is selected.
    pub fn begin_send(&mut self, selected: Option<&Conversation>) -> Option<PendingSend> {
        if self.is_sending() {
            debug!("Send already in progress, ignoring submit");
            return None;
        }
        if self.draft.trim().is_empty() {
            return None;
        }
        let conversation = selected?;

        let target = if conversation.is_group() {
            SendTarget::Group {
                conversation_id: conversation.id.clone(),
            }
        } else if conversation.match_id.is_empty() {
            warn!(conversation_id = %conversation.id, "Direct conversation has no match id");
            return None;
        } else {
            SendTarget::Direct {
                match_id: conversation.match_id.clone(),
            }
        };

        self.state = ComposerState::Sending;
        Some(PendingSend {
            text: std::mem::take(&mut self.draft),
            target,
            conversation: conversation.clone(),
        })
    }

    /// `Sending -> Committed`, back to `Idle`
    pub fn commit(&mut self) {
        self.state = ComposerState::Idle;
    }

    /// `Sending -> Failed`: restore the draft and return to `Idle`
    pub fn fail(&mut self, pending: &PendingSend) {
        self.draft = pending.text.clone();
        self.state = ComposerState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupConversation;

    #[test]
    fn test_begin_send_clears_draft() {
        let mut composer = MessageComposer::new();
        let conv = Conversation::temporary("m2", None);
        composer.set_draft("hello");

        let pending = composer.begin_send(Some(&conv)).unwrap();
        assert_eq!(pending.text, "hello");
        assert_eq!(
            pending.target,
            SendTarget::Direct {
                match_id: "m2".to_string()
            }
        );
        assert_eq!(composer.draft(), "");
        assert!(composer.is_sending());
    }

    #[test]
    fn test_second_submit_ignored_while_sending() {
        let mut composer = MessageComposer::new();
        let conv = Conversation::temporary("m2", None);
        composer.set_draft("one");
        composer.begin_send(Some(&conv)).unwrap();

        assert!(!composer.set_draft("two"));
        assert!(composer.begin_send(Some(&conv)).is_none());
    }

    #[test]
    fn test_blank_or_unselected_is_rejected() {
        let mut composer = MessageComposer::new();
        let conv = Conversation::temporary("m2", None);
        composer.set_draft("   ");
        assert!(composer.begin_send(Some(&conv)).is_none());

        composer.set_draft("hi");
        assert!(composer.begin_send(None).is_none());
        assert_eq!(composer.state(), ComposerState::Idle);
        assert_eq!(composer.draft(), "hi");
    }

    #[test]
    fn test_group_target_and_failure_restores_text() {
        let mut composer = MessageComposer::new();
        let conv = GroupConversation {
            id: "g1".to_string(),
            ..Default::default()
        }
        .into_conversation();
        composer.set_draft(" draft with spaces ");

        let pending = composer.begin_send(Some(&conv)).unwrap();
        assert_eq!(
            pending.target,
            SendTarget::Group {
                conversation_id: "g1".to_string()
            }
        );

        composer.fail(&pending);
        assert_eq!(composer.draft(), " draft with spaces ");
        assert_eq!(composer.state(), ComposerState::Idle);
    }
}
