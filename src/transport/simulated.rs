//! Simulated transports for development without radio or broker access

use crate::transport::traits::{
    Endpoint, NetworkLink, NetworkStatus, ScanOutcome, SessionCredentials, SessionLink,
    VisibleNetwork, WebhookClient,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

/// Simulated Wi-Fi: a fixed set of visible networks, one of which accepts
/// the configured password
pub struct SimulatedNetwork {
    ssid: String,
    password: String,
    visible: Vec<VisibleNetwork>,
    status: NetworkStatus,
}

impl SimulatedNetwork {
    /// A network `ssid` protected by `password`
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        let ssid = ssid.into();
        let visible = vec![VisibleNetwork {
            ssid: ssid.clone(),
            open: false,
        }];
        Self {
            ssid,
            password: password.into(),
            visible,
            status: NetworkStatus::Idle,
        }
    }

    /// Replace the networks a scan reports
    #[cfg(test)]
    pub fn with_visible(mut self, visible: Vec<VisibleNetwork>) -> Self {
        self.visible = visible;
        self
    }
}

#[async_trait]
impl NetworkLink for SimulatedNetwork {
    async fn begin(&mut self, ssid: &str, password: &str) -> Result<()> {
        let in_range = self.visible.iter().any(|n| n.ssid == ssid);
        self.status = if !in_range || ssid != self.ssid {
            NetworkStatus::Disconnected
        } else if password != self.password {
            NetworkStatus::ConnectFailed
        } else {
            NetworkStatus::Connected
        };
        debug!("[NET] Simulated association with \"{}\": {:?}", ssid, self.status);
        Ok(())
    }

    async fn status(&mut self) -> NetworkStatus {
        self.status
    }

    async fn scan(&mut self) -> ScanOutcome {
        ScanOutcome::Found(self.visible.clone())
    }

    fn local_address(&self) -> Option<String> {
        (self.status == NetworkStatus::Connected).then(|| "192.168.4.2".to_string())
    }

    fn name(&self) -> &'static str {
        "Simulated"
    }
}

/// Simulated broker session that accepts any credentials
#[derive(Default)]
pub struct SimulatedSession {
    connected: bool,
    published: u64,
}

impl SimulatedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages published so far
    pub fn published(&self) -> u64 {
        self.published
    }
}

#[async_trait]
impl SessionLink for SimulatedSession {
    async fn connect(
        &mut self,
        credentials: &SessionCredentials,
        endpoint: &Endpoint,
    ) -> Result<()> {
        if credentials.client_id.is_empty() {
            bail!("empty client id rejected by {}", endpoint);
        }
        self.connected = true;
        Ok(())
    }

    async fn is_connected(&mut self) -> bool {
        self.connected
    }

    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<()> {
        if !self.connected {
            bail!("simulated session is not connected");
        }
        self.published += 1;
        info!(
            "[MQTT] (simulated) #{} {} <- {}",
            self.published(),
            topic,
            String::from_utf8_lossy(&payload)
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Simulated MQTT"
    }
}

/// Webhook that logs the document instead of sending it
pub struct SimulatedWebhook;

#[async_trait]
impl WebhookClient for SimulatedWebhook {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16> {
        info!("[NOTIFY] (simulated) POST {} {}", url, body);
        Ok(204)
    }
}
