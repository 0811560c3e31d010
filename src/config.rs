use crate::errors::ClientError;
use reqwest::Url;
use std::{env, time::Duration};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
pub const BASE_URL_VAR: &str = "ACTIVITY_BOARD_BASE_URL";

/// How long a status message stays visible.
pub const MESSAGE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub base_url: Url,
    pub message_ttl: Duration,
}

impl BoardConfig {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ClientError::invalid_base_url(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::invalid_base_url(base_url.as_str()));
        }

        Ok(Self {
            base_url,
            message_ttl: MESSAGE_TTL,
        })
    }

    /// Reads `ACTIVITY_BOARD_BASE_URL`, falling back to the local backend.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`BoardConfig::from_env`] with an injectable variable source.
    /// Unset and blank values both fall back to [`DEFAULT_BASE_URL`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        match lookup(BASE_URL_VAR) {
            Some(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::new(DEFAULT_BASE_URL),
        }
    }

    pub fn with_message_ttl(mut self, ttl: Duration) -> Self {
        self.message_ttl = ttl;
        self
    }
}
