//! Transport trait abstraction for the network link, the MQTT session and
//! the webhook client

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

/// Link status as reported by the network collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Association not started yet
    Idle,
    /// Not connected
    Disconnected,
    /// Network was found but refused the connection (bad credentials)
    ConnectFailed,
    /// Connected and addressable
    Connected,
}

/// A network seen during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleNetwork {
    pub ssid: String,
    pub open: bool,
}

/// Result of probing for available networks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The scan failed or hasn't finished yet
    NotReady,
    /// The scan completed (possibly with no networks)
    Found(Vec<VisibleNetwork>),
}

/// Session credentials for the MQTT broker
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub client_id: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Host and port of a remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The station's network link (Wi-Fi on the device, a reachability probe on a host)
#[async_trait]
pub trait NetworkLink: Send {
    /// Start associating with the given network
    async fn begin(&mut self, ssid: &str, password: &str) -> Result<()>;

    /// Current link status
    async fn status(&mut self) -> NetworkStatus;

    /// Probe for available networks
    async fn scan(&mut self) -> ScanOutcome;

    /// Address assigned to the station, once connected
    fn local_address(&self) -> Option<String>;

    /// Human-readable name for this link
    fn name(&self) -> &'static str;
}

/// A publish/subscribe session on top of the network link
#[async_trait]
pub trait SessionLink: Send {
    /// Make a single connection attempt
    async fn connect(&mut self, credentials: &SessionCredentials, endpoint: &Endpoint)
        -> Result<()>;

    /// Whether the session is currently established.
    ///
    /// Implementations process whatever the broker already sent, so a
    /// connection closed since the last call is reported as down.
    async fn is_connected(&mut self) -> bool;

    /// Publish a payload on a topic
    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<()>;

    /// Human-readable name for this session
    fn name(&self) -> &'static str;
}

/// Client able to POST a JSON document to a webhook
#[async_trait]
pub trait WebhookClient: Send + Sync {
    /// POST `body` to `url`, returning the HTTP status code
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16>;
}
