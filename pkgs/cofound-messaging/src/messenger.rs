//! Messenger - owns the session's messaging state and drives every flow
//!
//! Two flows share the state: user actions (select, send, start a chat)
//! and the background refresh. State lives behind a synchronous mutex that
//! is never held across an await, so neither flow blocks the other; races
//! are settled by id-keyed merges in the store and selection controller.

use std::sync::Arc;

use chrono::Utc;
use futures::channel::mpsc;
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::backend::MessagingBackend;
use crate::composer::{MessageComposer, PendingSend, SendTarget};
use crate::config::MessengerConfig;
use crate::conversation_store::{ConversationStore, PrefetchedConversations};
use crate::error::{MessagingError, Result};
use crate::events::MessengerEvent;
use crate::matches;
use crate::models::{is_temporary_id, Conversation, GroupConversation, MatchSummary, Message};
use crate::profile_resolver::ProfileResolver;
use crate::refresher::{spawn_polling, PollingHandle, RefreshGate, RefreshOutcome};
use crate::selection::{SelectionChange, SelectionController};

/// Result of a submit
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Committed(Message),
    /// Nothing to send, nothing selected, or a send already in flight
    Ignored,
}

#[derive(Debug, Default)]
struct MessengerState {
    store: ConversationStore,
    resolver: ProfileResolver,
    selection: SelectionController,
    composer: MessageComposer,
    mutual_matches: Vec<MatchSummary>,
    loading: bool,
}

/// What a refresh has to do once the state lock is released
enum FollowUp {
    None,
    Selection(SelectionChange),
    ReloadHistory(String),
}

/// Messaging core for one view session
pub struct Messenger {
    backend: Arc<dyn MessagingBackend>,
    config: MessengerConfig,
    state: Mutex<MessengerState>,
    refresh_gate: RefreshGate,
    event_sender: mpsc::UnboundedSender<MessengerEvent>,
}

impl Messenger {
    /// Create a messenger. `session_identity` is the local profile id when
    /// the session knows it; otherwise it is derived from loaded data.
    pub fn new(
        backend: Arc<dyn MessagingBackend>,
        config: MessengerConfig,
        session_identity: Option<String>,
    ) -> (Self, mpsc::UnboundedReceiver<MessengerEvent>) {
        let (event_sender, event_receiver) = mpsc::unbounded();
        let state = MessengerState {
            resolver: ProfileResolver::new(session_identity),
            ..Default::default()
        };

        let messenger = Self {
            backend,
            config,
            state: Mutex::new(state),
            refresh_gate: RefreshGate::new(),
            event_sender,
        };
        (messenger, event_receiver)
    }

    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    // ---- conversation list -------------------------------------------------

    /// Fetch both listings ahead of time; the next [`load`](Self::load)
    /// consumes them instead of calling the backend
    #[instrument(skip(self))]
    pub async fn prefetch(&self) -> Result<()> {
        let (direct, group) = self.fetch_lists().await?;
        self.state
            .lock()
            .store
            .stash_prefetched(PrefetchedConversations { direct, group });
        Ok(())
    }

    /// Load the conversation list. On failure the previous contents stay
    /// and a notice is emitted.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<usize> {
        let prefetched = {
            let mut state = self.state.lock();
            state.loading = true;
            state.store.take_prefetched()
        };

        let fetched = match prefetched {
            Some(p) => {
                debug!("Using prefetched conversations");
                Ok((p.direct, p.group))
            }
            None => self.fetch_lists().await,
        };

        let result = fetched.map(|(direct, group)| self.apply_lists(direct, group));
        self.state.lock().loading = false;

        match result {
            Ok(count) => {
                info!(count, "Conversations loaded");
                self.emit(MessengerEvent::ConversationsUpdated { count });
                Ok(count)
            }
            Err(e) => {
                error!("Failed to load conversations: {}", e);
                self.notify("Failed to load conversations");
                Err(e)
            }
        }
    }

    /// One background refresh cycle. Skipped if another one is in flight.
    /// Never emits notices; callers decide whether to log the error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Some(_permit) = self.refresh_gate.try_enter() else {
            debug!("Refresh already in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        let (direct, group) = self.fetch_lists().await?;

        let (count, follow_up) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state
                .store
                .reconcile(ConversationStore::merge(direct, group));
            state.resolver.observe(state.store.conversations());
            (state.store.len(), Self::reconcile_selection(state))
        };
        self.emit(MessengerEvent::ConversationsUpdated { count });

        match follow_up {
            FollowUp::None => {}
            FollowUp::Selection(change) => {
                if let Err(e) = self.apply_selection_change(change, false).await {
                    warn!("Refresh could not load the confirmed conversation: {}", e);
                }
            }
            FollowUp::ReloadHistory(conversation_id) => {
                if let Err(e) = self.load_history(&conversation_id).await {
                    warn!("Refresh could not reload messages: {}", e);
                }
            }
        }

        Ok(RefreshOutcome::Refreshed {
            conversations: count,
        })
    }

    /// Start the background refresh loop. The loop stops when the returned
    /// handle is stopped or dropped.
    pub fn start_polling(self: &Arc<Self>) -> PollingHandle {
        let messenger = Arc::clone(self);
        spawn_polling(self.config.poll_interval, move || {
            let messenger = Arc::clone(&messenger);
            async move { messenger.refresh().await }
        })
    }

    async fn fetch_lists(&self) -> Result<(Vec<Conversation>, Vec<GroupConversation>)> {
        let (direct, group) = tokio::join!(
            self.backend.list_direct_conversations(),
            self.backend.list_group_conversations()
        );
        let group = group.unwrap_or_else(|e| {
            warn!("Group conversations unavailable, continuing without them: {}", e);
            Vec::new()
        });
        Ok((direct?, group))
    }

    fn apply_lists(&self, direct: Vec<Conversation>, group: Vec<GroupConversation>) -> usize {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state
            .store
            .reconcile(ConversationStore::merge(direct, group));
        state.resolver.observe(state.store.conversations());
        state.store.len()
    }

    fn reconcile_selection(state: &mut MessengerState) -> FollowUp {
        let Some(selected) = state.selection.selected() else {
            return FollowUp::None;
        };

        if selected.is_temporary() {
            let real = state.store.find_by_match(&selected.match_id).cloned();
            return match real {
                Some(real) => {
                    info!(
                        conversation_id = %real.id,
                        "Backend created the conversation, replacing placeholder"
                    );
                    FollowUp::Selection(state.selection.select(Some(real)))
                }
                None => FollowUp::None,
            };
        }

        let selected_id = selected.id.clone();
        let has_new_message = match state.store.get(&selected_id) {
            Some(updated) => state.selection.apply_refresh(updated),
            None => false,
        };
        if has_new_message {
            FollowUp::ReloadHistory(selected_id)
        } else {
            FollowUp::None
        }
    }

    // ---- selection ---------------------------------------------------------

    /// Select a conversation by id, or clear the selection with `None`
    #[instrument(skip(self))]
    pub async fn select_conversation(&self, conversation_id: Option<&str>) -> Result<()> {
        let change = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let conversation = match conversation_id {
                None => None,
                Some(id) => {
                    let found = state
                        .store
                        .get(id)
                        .or_else(|| state.selection.selected().filter(|c| c.id == id))
                        .cloned()
                        .ok_or_else(|| MessagingError::ConversationNotFound(id.to_string()))?;
                    Some(found)
                }
            };
            state.selection.select(conversation)
        };
        self.apply_selection_change(change, true).await
    }

    /// Select the conversation for `candidate`, or a new placeholder if the
    /// match has none yet
    #[instrument(skip(self, candidate), fields(match_id = %candidate.match_id))]
    pub async fn start_conversation(&self, candidate: &MatchSummary) -> Result<()> {
        let change = {
            let mut state = self.state.lock();
            if let Some(existing) = state.store.find_by_match(&candidate.match_id).cloned() {
                state.selection.select(Some(existing))
            } else if state
                .selection
                .selected()
                .is_some_and(|c| c.is_temporary() && c.match_id == candidate.match_id)
            {
                SelectionChange::Unchanged
            } else {
                state
                    .selection
                    .select(Some(matches::temporary_conversation(candidate)))
            }
        };
        self.apply_selection_change(change, true).await
    }

    /// Open the conversation for a match id, fetching the match detail to
    /// seed a placeholder when no conversation exists
    #[instrument(skip(self))]
    pub async fn open_match(&self, match_id: &str) -> Result<()> {
        let known = {
            let state = self.state.lock();
            state.store.find_by_match(match_id).is_some()
                || state
                    .selection
                    .selected()
                    .is_some_and(|c| c.is_temporary() && c.match_id == match_id)
        };
        if known {
            let candidate = MatchSummary {
                match_id: match_id.to_string(),
                profile: None,
            };
            return self.start_conversation(&candidate).await;
        }

        let candidate = match self.backend.get_match(match_id).await {
            Ok(candidate) => candidate,
            Err(e) => {
                error!("Failed to load match {} for new chat: {}", match_id, e);
                self.notify("Failed to open conversation");
                return Err(e);
            }
        };
        self.start_conversation(&candidate).await
    }

    async fn apply_selection_change(
        &self,
        change: SelectionChange,
        surface_errors: bool,
    ) -> Result<()> {
        match change {
            SelectionChange::Unchanged => Ok(()),
            SelectionChange::Cleared => {
                self.emit(MessengerEvent::SelectionChanged {
                    conversation_id: None,
                });
                Ok(())
            }
            SelectionChange::Switched {
                conversation_id,
                load_history,
                mark_read,
            } => {
                self.emit(MessengerEvent::SelectionChanged {
                    conversation_id: Some(conversation_id.clone()),
                });

                let mut result = Ok(());
                if load_history {
                    if let Err(e) = self.load_history(&conversation_id).await {
                        if surface_errors {
                            self.notify("Failed to load messages");
                        }
                        result = Err(e);
                    }
                }
                if mark_read {
                    if let Err(e) = self.mark_read(&conversation_id).await {
                        warn!("Failed to mark {} as read: {}", conversation_id, e);
                    }
                }
                result
            }
        }
    }

    /// Reload the history of the selected conversation
    pub async fn reload_messages(&self) -> Result<()> {
        let selected = self.state.lock().selection.selected_id().map(str::to_string);
        match selected {
            Some(id) => self.load_history(&id).await,
            None => Err(MessagingError::NoSelection),
        }
    }

    async fn load_history(&self, conversation_id: &str) -> Result<()> {
        if is_temporary_id(conversation_id) {
            self.state
                .lock()
                .selection
                .set_messages(conversation_id, Vec::new());
            return Ok(());
        }

        let messages = match self.backend.list_messages(conversation_id).await {
            Ok(messages) => messages,
            Err(e) => {
                error!("Failed to load messages for {}: {}", conversation_id, e);
                self.state
                    .lock()
                    .selection
                    .set_messages(conversation_id, Vec::new());
                return Err(e);
            }
        };

        let count = messages.len();
        let applied = self
            .state
            .lock()
            .selection
            .set_messages(conversation_id, messages);
        if applied {
            self.emit(MessengerEvent::MessagesLoaded {
                conversation_id: conversation_id.to_string(),
                count,
            });
        } else {
            debug!(conversation_id, "Discarding history for a deselected conversation");
        }
        Ok(())
    }

    /// Acknowledge a conversation as read and reset its unread counter.
    /// A no-op for placeholders.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, conversation_id: &str) -> Result<()> {
        if is_temporary_id(conversation_id) {
            return Ok(());
        }
        self.backend.mark_conversation_read(conversation_id).await?;

        let count = {
            let mut state = self.state.lock();
            state.store.mark_read(conversation_id);
            state.store.len()
        };
        self.emit(MessengerEvent::ConversationsUpdated { count });
        Ok(())
    }

    // ---- composer ----------------------------------------------------------

    /// Replace the draft; rejected while a send is in flight
    pub fn set_draft(&self, text: impl Into<String>) -> bool {
        self.state.lock().composer.set_draft(text)
    }

    /// Send the current draft to the selected conversation
    #[instrument(skip(self))]
    pub async fn send_message(&self) -> Result<SendOutcome> {
        let pending = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.composer.begin_send(state.selection.selected())
        };
        let Some(pending) = pending else {
            return Ok(SendOutcome::Ignored);
        };

        let sent = match &pending.target {
            SendTarget::Direct { match_id } => {
                self.backend
                    .send_direct_message(match_id, &pending.text)
                    .await
            }
            SendTarget::Group { conversation_id } => {
                self.backend
                    .send_group_message(conversation_id, &pending.text)
                    .await
            }
        };

        match sent {
            Ok(message) => {
                let events = self.commit_send(pending, message.clone());
                for event in events {
                    self.emit(event);
                }
                Ok(SendOutcome::Committed(message))
            }
            Err(e) => {
                error!("Failed to send message: {}", e);
                self.state.lock().composer.fail(&pending);
                self.emit(MessengerEvent::SendFailed {
                    conversation_id: pending.conversation.id.clone(),
                    error: e.to_string(),
                });
                self.notify("Failed to send message");
                Err(e)
            }
        }
    }

    fn commit_send(&self, pending: PendingSend, message: Message) -> Vec<MessengerEvent> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.composer.commit();

        let conversation = pending.conversation;
        let mut events = Vec::new();

        if !conversation.is_temporary() {
            state.selection.append_message(&conversation.id, message.clone());
            state.store.record_sent(&conversation.id, &message);
            events.push(MessengerEvent::MessageSent {
                conversation_id: conversation.id,
                message_id: message.id,
            });
            events.push(MessengerEvent::ConversationsUpdated {
                count: state.store.len(),
            });
            return events;
        }

        let Some(real_id) = message.conversation_id.clone().filter(|id| !id.is_empty()) else {
            warn!(
                temp_id = %conversation.id,
                "Send succeeded without a conversation id, keeping placeholder"
            );
            state.selection.append_message(&conversation.id, message.clone());
            events.push(MessengerEvent::MessageSent {
                conversation_id: conversation.id,
                message_id: message.id,
            });
            return events;
        };

        let temp_id = conversation.id.clone();
        let promoted = Conversation {
            id: real_id.clone(),
            last_message_at: Some(message.created_at.unwrap_or_else(Utc::now)),
            preview: Some(message.clone()),
            unread_count: 0,
            ..conversation
        };

        state.store.promote(&temp_id, promoted.clone(), &message);
        if state.selection.promote(&temp_id, promoted, message.clone()) {
            events.push(MessengerEvent::SelectionChanged {
                conversation_id: Some(real_id.clone()),
            });
        } else {
            state.selection.append_message(&real_id, message.clone());
        }

        events.push(MessengerEvent::ConversationPromoted {
            temp_id,
            conversation_id: real_id.clone(),
        });
        events.push(MessengerEvent::MessageSent {
            conversation_id: real_id,
            message_id: message.id,
        });
        events.push(MessengerEvent::ConversationsUpdated {
            count: state.store.len(),
        });
        events
    }

    // ---- matches -----------------------------------------------------------

    /// Fetch mutual matches. Failures are logged and returned, never shown.
    #[instrument(skip(self))]
    pub async fn load_available_matches(&self) -> Result<usize> {
        let fetched = match self.backend.list_mutual_matches().await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Failed to load mutual matches: {}", e);
                return Err(e);
            }
        };

        let available = {
            let mut state = self.state.lock();
            state.mutual_matches = fetched;
            matches::available_matches(state.store.conversations(), &state.mutual_matches).len()
        };
        self.emit(MessengerEvent::MatchesUpdated { available });
        Ok(available)
    }

    /// Mutual matches that have no conversation yet
    pub fn available_matches(&self) -> Vec<MatchSummary> {
        let state = self.state.lock();
        matches::available_matches(state.store.conversations(), &state.mutual_matches)
    }

    // ---- snapshots ---------------------------------------------------------

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state.lock().store.conversations().to_vec()
    }

    pub fn conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.state.lock().store.get(conversation_id).cloned()
    }

    pub fn selected_conversation(&self) -> Option<Conversation> {
        self.state.lock().selection.selected().cloned()
    }

    /// Visible history of the selected conversation, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().selection.messages().to_vec()
    }

    pub fn draft(&self) -> String {
        self.state.lock().composer.draft().to_string()
    }

    pub fn is_sending(&self) -> bool {
        self.state.lock().composer.is_sending()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn identity(&self) -> Option<String> {
        self.state.lock().resolver.identity().map(str::to_string)
    }

    /// Whether `message` in the selected conversation was sent by the local user
    pub fn is_own(&self, message: &Message) -> bool {
        let state = self.state.lock();
        match state.selection.selected() {
            Some(conversation) => state.resolver.is_own(message, conversation),
            None => state.resolver.identity() == Some(message.sender_id.as_str()),
        }
    }

    pub fn group_info_open(&self) -> bool {
        self.state.lock().selection.group_info_open()
    }

    pub fn toggle_group_info(&self) -> bool {
        self.state.lock().selection.toggle_group_info()
    }

    /// List preview for a conversation, using the configured lengths
    pub fn preview_line(&self, conversation: &Conversation) -> String {
        let me = self.identity();
        crate::display::preview_line(
            conversation,
            me.as_deref(),
            self.config.preview_length,
            self.config.group_preview_length,
        )
    }

    // ---- events ------------------------------------------------------------

    fn emit(&self, event: MessengerEvent) {
        let _ = self.event_sender.unbounded_send(event);
    }

    fn notify(&self, text: &str) {
        self.emit(MessengerEvent::Notice(text.to_string()));
    }
}
