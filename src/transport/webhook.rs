//! HTTP webhook client built on reqwest

use crate::transport::traits::WebhookClient;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Webhook client that issues a single JSON POST per call
pub struct HttpWebhook {
    client: reqwest::Client,
}

impl HttpWebhook {
    /// Create a client whose requests give up after `request_timeout`
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookClient for HttpWebhook {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}
