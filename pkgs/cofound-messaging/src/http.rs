//! REST implementation of [`MessagingBackend`]

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::backend::MessagingBackend;
use crate::config::MessengerConfig;
use crate::error::{MessagingError, Result};
use crate::models::{Conversation, GroupConversation, MatchSummary, Message};
use crate::wire::{
    SendMessageRequest, WireConversationList, WireGroupList, WireMatch, WireMessage,
    WireMessages, WireMutualMatches,
};

/// Messaging backend reached over HTTP with an optional bearer token
pub struct HttpBackend {
    client: Client,
    config: MessengerConfig,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: MessengerConfig, token: Option<String>) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            config,
            token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send the request and return the body of a successful response
    async fn send_checked(&self, request: RequestBuilder) -> Result<String> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MessagingError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send_checked(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn sent_message(wire: WireMessage) -> Result<Message> {
        wire.into_message().ok_or_else(|| {
            MessagingError::InvalidResponse("sent message has no message_id".to_string())
        })
    }
}

#[async_trait]
impl MessagingBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn list_direct_conversations(&self) -> Result<Vec<Conversation>> {
        let request = self
            .client
            .get(self.config.endpoint("/conversations"))
            .query(&[
                ("limit", self.config.conversation_page_size),
                ("offset", self.config.conversation_offset),
            ]);
        let list: WireConversationList = self.execute(request).await?;
        debug!(count = list.conversations.len(), "Fetched direct conversations");

        Ok(list
            .conversations
            .into_iter()
            .filter_map(|c| c.into_direct())
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_group_conversations(&self) -> Result<Vec<GroupConversation>> {
        let request = self
            .client
            .get(self.config.endpoint("/group-conversations"));
        let list: WireGroupList = self.execute(request).await?;
        Ok(list.into_groups())
    }

    #[instrument(skip(self))]
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let request = self
            .client
            .get(
                self.config
                    .endpoint(&format!("/conversations/{conversation_id}/messages")),
            )
            .query(&[("limit", self.config.message_page_size)]);
        let messages: WireMessages = self.execute(request).await?;
        Ok(messages.into_messages())
    }

    #[instrument(skip(self, text))]
    async fn send_direct_message(&self, match_id: &str, text: &str) -> Result<Message> {
        let request = self
            .client
            .post(self.config.endpoint(&format!("/conversations/{match_id}/messages")))
            .json(&SendMessageRequest { text });
        Self::sent_message(self.execute(request).await?)
    }

    #[instrument(skip(self, text))]
    async fn send_group_message(&self, conversation_id: &str, text: &str) -> Result<Message> {
        let request = self
            .client
            .post(
                self.config
                    .endpoint(&format!("/group-conversations/{conversation_id}/messages")),
            )
            .json(&SendMessageRequest { text });
        let mut message = Self::sent_message(self.execute(request).await?)?;
        message
            .conversation_id
            .get_or_insert_with(|| conversation_id.to_string());
        Ok(message)
    }

    #[instrument(skip(self))]
    async fn mark_conversation_read(&self, conversation_id: &str) -> Result<()> {
        let request = self
            .client
            .post(self.config.endpoint(&format!("/conversations/{conversation_id}/read")));
        self.send_checked(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_mutual_matches(&self) -> Result<Vec<MatchSummary>> {
        let request = self.client.get(self.config.endpoint("/matches/mutual"));
        let matches: WireMutualMatches = self.execute(request).await?;
        Ok(matches
            .mutual_matches
            .into_iter()
            .filter_map(WireMatch::into_match)
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: &str) -> Result<MatchSummary> {
        let request = self
            .client
            .get(self.config.endpoint(&format!("/matches/{match_id}")));
        let wire: WireMatch = self.execute(request).await?;
        wire.into_match()
            .ok_or_else(|| MessagingError::MatchNotFound(match_id.to_string()))
    }
}
