//! Webhook notifier

use crate::transport::WebhookClient;
use station_shared::codec::{is_webhook_success, webhook_embed};
use station_shared::Reading;
use tracing::{info, warn};

/// Posts every reading as an embed to a webhook
pub struct NotifySink {
    url: String,
    client: Box<dyn WebhookClient>,
}

impl NotifySink {
    pub fn new(url: impl Into<String>, client: Box<dyn WebhookClient>) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// Send one notification. The result is informational only.
    pub async fn notify(&self, reading: &Reading) -> bool {
        let body = webhook_embed(reading);
        match self.client.post_json(&self.url, &body).await {
            Ok(status) if is_webhook_success(status) => {
                info!("[NOTIFY] Notification delivered (HTTP {})", status);
                true
            }
            Ok(status) => {
                warn!("[NOTIFY] Webhook rejected the notification (HTTP {})", status);
                false
            }
            Err(e) => {
                warn!("[NOTIFY] Sending the notification failed: {:#}", e);
                false
            }
        }
    }
}
