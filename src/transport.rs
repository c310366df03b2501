//! HTTP delivery of iDx messages to the routing service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::CommunicatorError;

/// Delivers a message to an endpoint and returns the raw response body.
/// Swapped out in tests for a canned responder.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, message: &str, url: &Url) -> Result<String, CommunicatorError>;
}

/// [`Messenger`] that POSTs over HTTPS with reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpMessenger {
    client: reqwest::Client,
}

impl HttpMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with a per-request timeout instead of reqwest's default.
    pub fn with_timeout(timeout: Duration) -> Result<Self, CommunicatorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Messenger for HttpMessenger {
    async fn send_message(&self, message: &str, url: &Url) -> Result<String, CommunicatorError> {
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(message.to_string())
            .send()
            .await?;

        debug!(status = %response.status(), %url, "result status");
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}
