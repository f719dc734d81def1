//! Cofound Messaging - conversation state for the co-founder matching client
//!
//! This crate keeps a session's view of direct and group conversations
//! consistent while two flows mutate it concurrently: user actions and a
//! periodic background refresh.
//!
//! # Architecture
//!
//! - **ConversationStore**: merged, activity-ordered conversation list with
//!   id-keyed reconciliation
//! - **ProfileResolver**: which participant slot is the local user
//! - **SelectionController**: the active conversation and its visible history
//! - **MessageComposer**: draft text and the `Idle -> Sending` state machine
//! - **Polling**: cancellable background refresh loop
//! - **Messenger**: ties the above to a [`MessagingBackend`] and reports
//!   changes as [`MessengerEvent`]s
//!
//! # Temporary conversations
//!
//! Starting a chat with a match that has no conversation yet selects a
//! placeholder whose id starts with `temp_`. The first successful send
//! promotes it to the conversation the backend created. Placeholders never
//! load history and are never marked as read.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cofound_messaging::{HttpBackend, Messenger, MessengerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MessengerConfig::from_env()?;
//! let backend = Arc::new(HttpBackend::new(config.clone(), Some("token".to_string()))?);
//! let (messenger, _events) = Messenger::new(backend, config, None);
//! let messenger = Arc::new(messenger);
//!
//! messenger.load().await?;
//! let polling = messenger.start_polling();
//!
//! if let Some(first) = messenger.conversations().first() {
//!     messenger.select_conversation(Some(first.id.as_str())).await?;
//!     messenger.set_draft("Hello!");
//!     messenger.send_message().await?;
//! }
//!
//! polling.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod composer;
pub mod config;
pub mod conversation_store;
pub mod display;
pub mod error;
pub mod events;
pub mod http;
pub mod matches;
pub mod messenger;
pub mod models;
pub mod profile_resolver;
pub mod refresher;
pub mod selection;

mod wire;

pub use backend::MessagingBackend;
pub use composer::{ComposerState, MessageComposer, PendingSend, SendTarget};
pub use config::MessengerConfig;
pub use conversation_store::{ConversationStore, PrefetchedConversations};
pub use error::{MessagingError, Result};
pub use events::MessengerEvent;
pub use http::HttpBackend;
pub use messenger::{Messenger, SendOutcome};
pub use models::{
    is_temporary_id, Conversation, ConversationKind, GroupConversation, GroupDetails, MatchSummary,
    Message, Participant, ParticipantRole, ProfileSummary,
};
pub use profile_resolver::{IdentitySource, ProfileResolver};
pub use refresher::{spawn_polling, PollingHandle, RefreshGate, RefreshOutcome};
pub use selection::{SelectionChange, SelectionController};
