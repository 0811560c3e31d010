use crate::config::BoardConfig;
use crate::errors::ClientError;
use crate::models::{ActivityCatalog, ApiReply, MessageBody};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use tracing::debug;

/// The activities backend as seen by the board.
#[async_trait]
pub trait ActivityApi: Send + Sync + 'static {
    /// `GET /activities`
    async fn fetch_catalog(&self) -> Result<ActivityCatalog, ClientError>;

    /// `POST /activities/{name}/signup?email={email}`
    async fn signup(&self, activity: &str, email: &str) -> Result<ApiReply, ClientError>;

    /// `DELETE /activities/{name}/signup?email={email}`
    async fn unregister(&self, activity: &str, email: &str) -> Result<ApiReply, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpActivityApi {
    client: Client,
    base_url: Url,
}

impl HttpActivityApi {
    pub fn new(config: &BoardConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &BoardConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    pub fn activities_url(&self) -> Result<Url, ClientError> {
        self.endpoint(&["activities"])
    }

    /// Path segment and query value are percent-encoded by `Url`.
    pub fn signup_url(&self, activity: &str, email: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&["activities", activity, "signup"])?;
        url.query_pairs_mut().clear().append_pair("email", email);
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|()| ClientError::invalid_base_url(self.base_url.as_str()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn submit(
        &self,
        method: Method,
        activity: &str,
        email: &str,
    ) -> Result<ApiReply, ClientError> {
        let url = self.signup_url(activity, email)?;
        debug!(%method, %url, "sending signup request");

        let response = self.client.request(method, url).send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body: MessageBody = serde_json::from_slice(&bytes)?;

        Ok(ApiReply { status, body })
    }
}

#[async_trait]
impl ActivityApi for HttpActivityApi {
    async fn fetch_catalog(&self) -> Result<ActivityCatalog, ClientError> {
        let url = self.activities_url()?;
        debug!(%url, "fetching activities");

        let bytes = self.client.get(url).send().await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn signup(&self, activity: &str, email: &str) -> Result<ApiReply, ClientError> {
        self.submit(Method::POST, activity, email).await
    }

    async fn unregister(&self, activity: &str, email: &str) -> Result<ApiReply, ClientError> {
        self.submit(Method::DELETE, activity, email).await
    }
}
