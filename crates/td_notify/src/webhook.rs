use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use td_core::{Error, Result};

/// Incoming-webhook transport: JSON in, success status out.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Notification(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn post(&self, payload: &Value) -> Result<()> {
        let resp = self.client.post(&self.url).json(payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Notification(format!("webhook returned {}: {}", status, body)));
        }

        tracing::debug!(status = %status, "Webhook accepted payload");
        Ok(())
    }

    /// Any HTTP answer means the endpoint is reachable; only transport
    /// failures are errors. Nothing is posted.
    pub async fn probe(&self) -> Result<StatusCode> {
        let resp = self.client.get(&self.url).send().await?;
        Ok(resp.status())
    }
}

impl fmt::Debug for WebhookClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookClient")
            .field("client", &"<reqwest::Client>")
            .field("url", &"<redacted>")
            .finish()
    }
}
