//! Host network link backed by a TCP reachability probe
//!
//! On a host the operating system owns the actual network interface, so the
//! link is considered up when a TCP connection to the probe address can be
//! opened.

use crate::transport::traits::{NetworkLink, NetworkStatus, ScanOutcome, VisibleNetwork};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;

/// Network link that probes a well-known address
pub struct ProbeNetwork {
    probe_address: String,
    connect_timeout: Duration,
    associated: bool,
    local_address: Option<String>,
}

impl ProbeNetwork {
    /// Create a probe for `probe_address` (`host:port`)
    pub fn new(probe_address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            probe_address: probe_address.into(),
            connect_timeout,
            associated: false,
            local_address: None,
        }
    }
}

#[async_trait]
impl NetworkLink for ProbeNetwork {
    async fn begin(&mut self, ssid: &str, _password: &str) -> Result<()> {
        // The host OS manages association; the SSID is informational only
        debug!(
            "[NET] Host link for \"{}\" will probe {}",
            ssid, self.probe_address
        );
        self.associated = true;
        Ok(())
    }

    async fn status(&mut self) -> NetworkStatus {
        if !self.associated {
            return NetworkStatus::Idle;
        }

        match timeout(self.connect_timeout, TcpStream::connect(&self.probe_address)).await {
            Ok(Ok(stream)) => {
                self.local_address = stream.local_addr().ok().map(|addr| addr.ip().to_string());
                NetworkStatus::Connected
            }
            Ok(Err(e)) => {
                debug!("[NET] Probe {} failed: {}", self.probe_address, e);
                self.local_address = None;
                NetworkStatus::Disconnected
            }
            Err(_) => {
                debug!("[NET] Probe {} timed out", self.probe_address);
                self.local_address = None;
                NetworkStatus::Disconnected
            }
        }
    }

    async fn scan(&mut self) -> ScanOutcome {
        match lookup_host(&self.probe_address).await {
            Ok(addrs) => ScanOutcome::Found(
                addrs
                    .map(|addr| VisibleNetwork {
                        ssid: addr.to_string(),
                        open: true,
                    })
                    .collect(),
            ),
            Err(e) => {
                debug!("[NET] Resolving {} failed: {}", self.probe_address, e);
                ScanOutcome::Found(Vec::new())
            }
        }
    }

    fn local_address(&self) -> Option<String> {
        self.local_address.clone()
    }

    fn name(&self) -> &'static str {
        "Probe"
    }
}
