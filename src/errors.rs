use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("failed to render activities: {0}")]
    Render(#[from] askama::Error),
    #[error("base url cannot carry a path: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    pub fn invalid_base_url(url: impl Into<String>) -> Self {
        Self::InvalidBaseUrl(url.into())
    }
}
