//! Scriptable collaborators for unit tests
//!
//! Every mock appends to a shared [`CallLog`] so tests can assert both call
//! counts and the relative order of calls across collaborators.

use crate::measure::{LightSensor, PressureSensor, SamplingProfile};
use crate::transport::{
    Endpoint, NetworkLink, NetworkStatus, ScanOutcome, SessionCredentials, SessionLink,
    VisibleNetwork, WebhookClient,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Assert that `expected` of (paused) virtual time passed since `start`
pub fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "expected {:?} to pass, got {:?}",
        expected,
        elapsed
    );
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn count(&self, call: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    /// Calls matching any of `names`, in the order they happened
    pub fn only(&self, names: &[&str]) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|c| names.contains(&c.as_str()))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Network whose status turns `Connected` after a number of failed polls
pub struct MockNetwork {
    log: CallLog,
    connect_after: Option<usize>,
    status_calls: usize,
    failure_status: NetworkStatus,
    scans: Vec<ScanOutcome>,
    outage: Option<Arc<AtomicBool>>,
}

impl MockNetwork {
    /// Connected from the first status check
    pub fn reachable(log: &CallLog) -> Self {
        Self::connecting_after(log, 0)
    }

    /// Never connects
    pub fn unreachable(log: &CallLog) -> Self {
        Self {
            connect_after: None,
            ..Self::connecting_after(log, 0)
        }
    }

    /// The first `failures` status checks report a failure
    pub fn connecting_after(log: &CallLog, failures: usize) -> Self {
        Self {
            log: log.clone(),
            connect_after: Some(failures),
            status_calls: 0,
            failure_status: NetworkStatus::Disconnected,
            scans: vec![ScanOutcome::Found(vec![VisibleNetwork {
                ssid: "neighbour".into(),
                open: true,
            }])],
            outage: None,
        }
    }

    /// Status reported while not connected
    pub fn with_failure_status(mut self, status: NetworkStatus) -> Self {
        self.failure_status = status;
        self
    }

    /// Scan results, returned in order; the last one repeats
    pub fn with_scans(mut self, scans: Vec<ScanOutcome>) -> Self {
        self.scans = scans;
        self
    }

    /// While the flag is set the link reports a failure
    pub fn with_outage(mut self, outage: Arc<AtomicBool>) -> Self {
        self.outage = Some(outage);
        self
    }
}

#[async_trait]
impl NetworkLink for MockNetwork {
    async fn begin(&mut self, _ssid: &str, _password: &str) -> Result<()> {
        self.log.push("network.begin");
        Ok(())
    }

    async fn status(&mut self) -> NetworkStatus {
        self.log.push("network.status");
        self.status_calls += 1;

        if self.outage.as_ref().is_some_and(|o| o.load(Ordering::SeqCst)) {
            return self.failure_status;
        }
        match self.connect_after {
            Some(failures) if self.status_calls > failures => NetworkStatus::Connected,
            _ => self.failure_status,
        }
    }

    async fn scan(&mut self) -> ScanOutcome {
        self.log.push("network.scan");
        if self.scans.len() > 1 {
            self.scans.remove(0)
        } else {
            self.scans[0].clone()
        }
    }

    fn local_address(&self) -> Option<String> {
        Some("10.0.0.2".into())
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}

/// Session that accepts connections after a number of refusals
pub struct MockSession {
    log: CallLog,
    accept_after: Option<usize>,
    connect_calls: usize,
    connected: bool,
    publish_ok: bool,
    drop_after_publish: bool,
}

impl MockSession {
    pub fn accepting(log: &CallLog) -> Self {
        Self::accepting_after(log, 0)
    }

    pub fn refusing(log: &CallLog) -> Self {
        Self {
            accept_after: None,
            ..Self::accepting_after(log, 0)
        }
    }

    pub fn accepting_after(log: &CallLog, refusals: usize) -> Self {
        Self {
            log: log.clone(),
            accept_after: Some(refusals),
            connect_calls: 0,
            connected: false,
            publish_ok: true,
            drop_after_publish: false,
        }
    }

    pub fn with_failing_publish(mut self) -> Self {
        self.publish_ok = false;
        self
    }

    /// The broker drops the session right after each publish
    pub fn dropping_after_publish(mut self) -> Self {
        self.drop_after_publish = true;
        self
    }
}

#[async_trait]
impl SessionLink for MockSession {
    async fn connect(
        &mut self,
        _credentials: &SessionCredentials,
        _endpoint: &Endpoint,
    ) -> Result<()> {
        self.log.push("session.connect");
        self.connect_calls += 1;
        match self.accept_after {
            Some(refusals) if self.connect_calls > refusals => {
                self.connected = true;
                Ok(())
            }
            _ => bail!("connection refused"),
        }
    }

    async fn is_connected(&mut self) -> bool {
        self.log.push("session.is_connected");
        self.connected
    }

    async fn publish(&mut self, _topic: &str, _payload: Bytes) -> Result<()> {
        self.log.push("session.publish");
        if self.drop_after_publish {
            self.connected = false;
        }
        if self.publish_ok {
            Ok(())
        } else {
            bail!("publish rejected")
        }
    }

    fn name(&self) -> &'static str {
        "Mock MQTT"
    }
}

/// Webhook answering every POST with a fixed status
pub struct MockWebhook {
    log: CallLog,
    status: Option<u16>,
}

impl MockWebhook {
    pub fn answering(log: &CallLog, status: u16) -> Self {
        Self {
            log: log.clone(),
            status: Some(status),
        }
    }

    /// Every request fails at the transport level
    pub fn unreachable(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            status: None,
        }
    }
}

#[async_trait]
impl WebhookClient for MockWebhook {
    async fn post_json(&self, _url: &str, _body: &serde_json::Value) -> Result<u16> {
        self.log.push("webhook.post");
        match self.status {
            Some(status) => Ok(status),
            None => bail!("connection reset"),
        }
    }
}

pub struct MockLight {
    log: CallLog,
    healthy: bool,
    lux: f32,
}

impl MockLight {
    pub fn new(log: &CallLog, lux: f32) -> Self {
        Self {
            log: log.clone(),
            healthy: true,
            lux,
        }
    }

    pub fn broken(log: &CallLog) -> Self {
        Self {
            healthy: false,
            ..Self::new(log, 0.0)
        }
    }
}

impl LightSensor for MockLight {
    fn begin(&mut self) -> Result<()> {
        self.log.push("light.begin");
        if !self.healthy {
            bail!("no response on I2C bus");
        }
        Ok(())
    }

    fn read_light_level(&mut self) -> f32 {
        self.log.push("sensor.read");
        self.lux
    }
}

pub struct MockPressure {
    log: CallLog,
    healthy: bool,
    temperature_c: f32,
    pressure_pa: f32,
    profile: Arc<Mutex<Option<SamplingProfile>>>,
}

impl MockPressure {
    pub fn new(log: &CallLog, temperature_c: f32, pressure_pa: f32) -> Self {
        Self {
            log: log.clone(),
            healthy: true,
            temperature_c,
            pressure_pa,
            profile: Arc::new(Mutex::new(None)),
        }
    }

    pub fn broken(log: &CallLog) -> Self {
        Self {
            healthy: false,
            ..Self::new(log, 0.0, 0.0)
        }
    }

    /// Handle to the sampling profile applied by the driver
    pub fn profile(&self) -> Arc<Mutex<Option<SamplingProfile>>> {
        self.profile.clone()
    }
}

impl PressureSensor for MockPressure {
    fn begin(&mut self, address: u8) -> Result<()> {
        self.log.push(format!("pressure.begin@{:#04x}", address));
        if !self.healthy {
            bail!("chip id mismatch");
        }
        Ok(())
    }

    fn set_sampling(&mut self, profile: SamplingProfile) {
        self.log.push("pressure.sampling");
        *self.profile.lock().unwrap() = Some(profile);
    }

    fn read_temperature(&mut self) -> f32 {
        self.temperature_c
    }

    fn read_pressure(&mut self) -> f32 {
        self.pressure_pa
    }
}
