//! Connection state for the network link and the MQTT session
//!
//! Both transports are brought up with the same bounded retry loop. The
//! session depends on the network: it is only attempted while the network
//! link is up.

use super::retry::RetryPolicy;
use crate::transport::{
    Endpoint, NetworkLink, NetworkStatus, ScanOutcome, SessionCredentials, SessionLink,
    VisibleNetwork,
};
use station_shared::retry;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Up/down state of a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Down,
    Up,
}

/// Tracked state of one transport
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportLink {
    state: LinkState,
    /// Outcome of the very first connect call; `None` until one was made
    first_attempt: Option<bool>,
}

impl TransportLink {
    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_up(&self) -> bool {
        self.state() == LinkState::Up
    }

    /// Outcome of the first connect call, if one was made
    pub fn first_attempt(&self) -> Option<bool> {
        self.first_attempt
    }

    /// Whether the transport may be retried at all.
    ///
    /// A transport whose first connect call failed (or never happened) stays
    /// excluded for the lifetime of the process.
    pub fn first_attempt_succeeded(&self) -> bool {
        self.first_attempt() == Some(true)
    }

    fn set(&mut self, up: bool) {
        self.state = if up { LinkState::Up } else { LinkState::Down };
    }

    fn record_attempt(&mut self, connected: bool) {
        self.set(connected);
        self.first_attempt.get_or_insert(connected);
    }
}

/// Why a network connection attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// Scanning failed or did not finish in time
    ScanNotReady,
    /// The scan completed without finding any network
    NoNetworks,
    /// The network is there but refused the credentials
    WrongCredentials,
    /// The configured network was not among the visible ones
    SsidNotFound { visible: Vec<VisibleNetwork> },
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::ScanNotReady => {
                write!(f, "scanning for networks failed or is not done yet")
            }
            FailureCause::NoNetworks => write!(f, "no available networks have been found"),
            FailureCause::WrongCredentials => write!(
                f,
                "the network has been found but refused the connection, please check the credentials"
            ),
            FailureCause::SsidNotFound { visible } => write!(
                f,
                "the configured network is not among the {} visible network(s)",
                visible.len()
            ),
        }
    }
}

/// Classify a failed network attempt from the scan result and link status
pub fn classify_failure(scan: &ScanOutcome, status: NetworkStatus) -> FailureCause {
    match scan {
        ScanOutcome::NotReady => FailureCause::ScanNotReady,
        ScanOutcome::Found(visible) if visible.is_empty() => FailureCause::NoNetworks,
        _ if status == NetworkStatus::ConnectFailed => FailureCause::WrongCredentials,
        ScanOutcome::Found(visible) => FailureCause::SsidNotFound {
            visible: visible.clone(),
        },
    }
}

/// Connectivity state owned by the station loop
pub struct ConnectionState {
    network: Box<dyn NetworkLink>,
    session: Box<dyn SessionLink>,
    policy: RetryPolicy,
    network_link: TransportLink,
    session_link: TransportLink,
}

impl ConnectionState {
    pub fn new(
        network: Box<dyn NetworkLink>,
        session: Box<dyn SessionLink>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            network,
            session,
            policy,
            network_link: TransportLink::default(),
            session_link: TransportLink::default(),
        }
    }

    pub fn network_link(&self) -> TransportLink {
        self.network_link
    }

    pub fn session_link(&self) -> TransportLink {
        self.session_link
    }

    /// The session transport, for sinks that publish over it
    pub fn session_mut(&mut self) -> &mut dyn SessionLink {
        self.session.as_mut()
    }

    /// Bring the network link up, retrying up to the policy's bound
    pub async fn connect_network(&mut self, ssid: &str, password: &str) -> bool {
        info!(
            "[NET] Connecting to network \"{}\" via {} link...",
            ssid,
            self.network.name()
        );
        if let Err(e) = self.network.begin(ssid, password).await {
            warn!("[NET] Could not start association: {:#}", e);
        }

        let max_attempts = self.policy.max_attempts;
        let mut attempts = 0;
        while attempts < max_attempts {
            let status = self.network.status().await;
            if status == NetworkStatus::Connected {
                info!(
                    "[NET] Successfully connected to \"{}\" with address {}",
                    ssid,
                    self.network
                        .local_address()
                        .unwrap_or_else(|| "<unknown>".into())
                );
                self.network_link.record_attempt(true);
                return true;
            }

            let scan = self.scan_settled().await;
            let cause = classify_failure(&scan, status);
            attempts += 1;
            warn!(
                "[NET] Attempt {}/{} failed: {}. Retrying in {:?}...",
                attempts, max_attempts, cause, self.policy.delay
            );
            if let FailureCause::SsidNotFound { visible } = &cause {
                log_visible_networks(ssid, visible);
            }
            self.policy.pause().await;
        }

        warn!(
            "[NET] WARNING: Connecting to \"{}\" failed after {} attempts. Everything that depends on the network will be disabled.",
            ssid, max_attempts
        );
        // Leave the warning on screen before moving on
        self.policy.pause().await;
        self.network_link.record_attempt(false);
        false
    }

    /// Bring the MQTT session up, retrying up to the policy's bound
    pub async fn connect_session(
        &mut self,
        credentials: &SessionCredentials,
        endpoint: &Endpoint,
    ) -> bool {
        info!(
            "[MQTT] Connecting to broker {} as \"{}\"...",
            endpoint, credentials.client_id
        );

        let max_attempts = self.policy.max_attempts;
        let mut attempts = 0;
        while attempts < max_attempts {
            if self.session.is_connected().await {
                self.session_link.record_attempt(true);
                return true;
            }

            attempts += 1;
            match self.session.connect(credentials, endpoint).await {
                Ok(()) => {
                    info!(
                        "[MQTT] Successfully connected to the broker via {}",
                        self.session.name()
                    );
                    self.session_link.record_attempt(true);
                    return true;
                }
                Err(e) => {
                    warn!(
                        "[MQTT] Attempt {}/{} failed: {:#}. Retrying in {:?}...",
                        attempts, max_attempts, e, self.policy.delay
                    );
                }
            }
            self.policy.pause().await;
        }

        warn!(
            "[MQTT] WARNING: Connecting to the broker failed after {} attempts. Everything that depends on the MQTT session will be disabled.",
            max_attempts
        );
        self.policy.pause().await;
        self.session_link.record_attempt(false);
        false
    }

    /// Return immediately if the network is up, reconnect otherwise
    pub async fn ensure_network_up(&mut self, ssid: &str, password: &str) -> bool {
        if self.network.status().await == NetworkStatus::Connected {
            self.network_link.set(true);
            return true;
        }

        self.network_link.set(false);
        warn!("[NET] The network connection has been lost. Trying to reconnect...");
        self.connect_network(ssid, password).await
    }

    /// Return immediately if the session is up, reconnect otherwise.
    ///
    /// Never touches the session while the network link is down.
    pub async fn ensure_session_up(
        &mut self,
        credentials: &SessionCredentials,
        endpoint: &Endpoint,
    ) -> bool {
        if !self.network_link.is_up() {
            debug!("[MQTT] Network link is down; not checking the session");
            self.session_link.set(false);
            return false;
        }

        if self.session.is_connected().await {
            self.session_link.set(true);
            return true;
        }

        self.session_link.set(false);
        warn!("[MQTT] The connection to the broker has been lost. Trying to reconnect...");
        self.connect_session(credentials, endpoint).await
    }

    /// Scan, polling again while the radio reports the scan as not ready
    async fn scan_settled(&mut self) -> ScanOutcome {
        let poll_interval = Duration::from_millis(retry::SCAN_POLL_INTERVAL_MS);
        let mut outcome = self.network.scan().await;
        let mut polls = 0;
        while outcome == ScanOutcome::NotReady && polls < retry::SCAN_POLL_LIMIT {
            sleep(poll_interval).await;
            outcome = self.network.scan().await;
            polls += 1;
        }
        outcome
    }
}

fn log_visible_networks(ssid: &str, visible: &[VisibleNetwork]) {
    warn!(
        "[NET] Make sure \"{}\" is an available network. {} network(s) have been found:",
        ssid,
        visible.len()
    );
    for network in visible {
        info!(
            "[NET]    - {} ({} network)",
            network.ssid,
            if network.open { "public" } else { "private" }
        );
    }
}
