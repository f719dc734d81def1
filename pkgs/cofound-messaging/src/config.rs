//! Messenger configuration

use std::time::Duration;

use crate::error::{MessagingError, Result};

pub const ENV_BASE_URL: &str = "COFOUND_BASE_URL";
pub const ENV_POLL_SECS: &str = "COFOUND_POLL_SECS";
pub const ENV_MESSAGE_LIMIT: &str = "COFOUND_MESSAGE_LIMIT";
pub const ENV_TIMEOUT_SECS: &str = "COFOUND_TIMEOUT_SECS";

/// Configuration for the messaging core and its HTTP backend
#[derive(Debug, Clone)]
pub struct MessengerConfig {
    /// Backend origin, without trailing slash (default: http://localhost:8000)
    pub base_url: String,

    /// Path prefix of the matching API (default: /api/v1/cofounder-matching)
    pub api_prefix: String,

    /// Period of the background refresh (default: 15s)
    pub poll_interval: Duration,

    /// Page size for the direct conversation listing (default: 20)
    pub conversation_page_size: usize,

    /// Offset for the direct conversation listing (default: 0)
    pub conversation_offset: usize,

    /// Page size for message history loads (default: 50)
    pub message_page_size: usize,

    /// Per-request timeout (default: 30s)
    pub request_timeout: Duration,

    /// Preview length in the conversation list for direct chats (default: 35)
    pub preview_length: usize,

    /// Preview length for group chats, including the sender label (default: 32)
    pub group_preview_length: usize,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "/api/v1/cofounder-matching".to_string(),
            poll_interval: Duration::from_secs(15),
            conversation_page_size: 20,
            conversation_offset: 0,
            message_page_size: 50,
            request_timeout: Duration::from_secs(30),
            preview_length: 35,
            group_preview_length: 32,
        }
    }
}

impl MessengerConfig {
    /// Defaults overlaid with `COFOUND_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup(ENV_POLL_SECS) {
            config.poll_interval = Duration::from_secs(parse_number(ENV_POLL_SECS, &secs)?);
        }
        if let Some(limit) = lookup(ENV_MESSAGE_LIMIT) {
            config.message_page_size = parse_number(ENV_MESSAGE_LIMIT, &limit)? as usize;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(MessagingError::InvalidConfig("base_url is empty".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(MessagingError::InvalidConfig(
                "poll_interval must be positive".to_string(),
            ));
        }
        if self.conversation_page_size == 0 || self.message_page_size == 0 {
            return Err(MessagingError::InvalidConfig(
                "page sizes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute URL of an API path such as `/conversations`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| MessagingError::InvalidConfig(format!("{key} is not a number: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = MessengerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.message_page_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://api.example.com/"),
            (ENV_POLL_SECS, "5"),
            (ENV_MESSAGE_LIMIT, "100"),
        ]
        .into_iter()
        .collect();

        let config =
            MessengerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.message_page_size, 100);
        assert_eq!(
            config.endpoint("/conversations"),
            "https://api.example.com/api/v1/cofounder-matching/conversations"
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_number = MessengerConfig::from_lookup(|key| {
            (key == ENV_POLL_SECS).then(|| "soon".to_string())
        });
        assert!(matches!(bad_number, Err(MessagingError::InvalidConfig(_))));

        let zero_poll =
            MessengerConfig::from_lookup(|key| (key == ENV_POLL_SECS).then(|| "0".to_string()));
        assert!(matches!(zero_poll, Err(MessagingError::InvalidConfig(_))));
    }
}
