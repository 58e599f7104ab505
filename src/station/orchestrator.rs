//! Station orchestrator
//!
//! Boots the station once, then runs the measurement cycle forever:
//! check the network, check the session, read the sensors and forward the
//! reading to every sink whose transport is up.

use crate::config::StationConfig;
use crate::connection::ConnectionState;
use crate::measure::{log_reading, LightSensor, MeasurementSource, PressureSensor};
use crate::sink::{NotifySink, TelemetrySink};
use crate::transport::{NetworkLink, SessionLink, WebhookClient};
use station_shared::state_machine::{
    is_valid_transition, StationEvent, StationState, StationStateMachine, TransitionResult,
};
use station_shared::Reading;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// What happened to a reading at one sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    Delivered,
    Failed,
    /// The sink's transport was down, nothing was sent
    Skipped,
}

impl SinkOutcome {
    fn from_delivery(delivered: bool) -> Self {
        if delivered {
            SinkOutcome::Delivered
        } else {
            SinkOutcome::Failed
        }
    }
}

/// Summary of one measurement cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub network_up: bool,
    pub session_up: bool,
    pub reading: Reading,
    pub telemetry: SinkOutcome,
    pub notify: SinkOutcome,
}

pub struct Orchestrator {
    config: StationConfig,
    lifecycle: StationStateMachine,
    connection: ConnectionState,
    source: Option<MeasurementSource>,
    telemetry: TelemetrySink,
    notifier: NotifySink,
}

impl Orchestrator {
    pub fn new(
        config: StationConfig,
        network: Box<dyn NetworkLink>,
        session: Box<dyn SessionLink>,
        webhook: Box<dyn WebhookClient>,
    ) -> Self {
        let connection = ConnectionState::new(network, session, config.retry.clone());
        let telemetry = TelemetrySink::new(config.credentials.channel_id);
        let notifier = NotifySink::new(config.credentials.webhook_url.clone(), webhook);
        Self {
            config,
            lifecycle: StationStateMachine::new(),
            connection,
            source: None,
            telemetry,
            notifier,
        }
    }

    pub fn state(&self) -> StationState {
        self.lifecycle.state()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.lifecycle.cycles_completed()
    }

    #[cfg(test)]
    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    /// Connect both transports once and initialize the sensors.
    ///
    /// Transport failures are not fatal. A sensor failure leaves the
    /// station [`StationState::Disabled`].
    pub async fn boot(
        &mut self,
        light: Box<dyn LightSensor>,
        pressure: Box<dyn PressureSensor>,
    ) -> StationState {
        info!(
            "[STATION] Booting (a failing transport gives up after {:?})...",
            self.config.retry.worst_case()
        );
        let network = &self.config.credentials.network;
        let network_ok = self
            .connection
            .connect_network(&network.ssid, &network.password)
            .await;
        self.transition(StationEvent::NetworkAttempted {
            connected: network_ok,
        });

        let session_ok = if network_ok {
            self.connection
                .connect_session(&self.config.credentials.session, &self.config.broker)
                .await
        } else {
            warn!("[MQTT] Network is unavailable; the MQTT session will not be attempted");
            false
        };
        self.transition(StationEvent::SessionAttempted {
            connected: session_ok,
        });

        match MeasurementSource::initialize(light, pressure) {
            Ok(source) => {
                self.source = Some(source);
                self.transition(StationEvent::SensorsReady);
            }
            Err(e) => {
                error!("[SENSOR] {}. The station is disabled.", e);
                self.transition(StationEvent::SensorsFailed);
            }
        }

        self.state()
    }

    /// Run one measurement cycle. Returns `None` if the station cannot run
    /// cycles (not booted or disabled).
    pub async fn run_cycle(&mut self) -> Option<CycleReport> {
        if !self.lifecycle.can_start_cycle() {
            return None;
        }
        self.transition(StationEvent::CycleStarted);

        let creds = &self.config.credentials;
        let network_up = self.connection.network_link().first_attempt_succeeded()
            && self
                .connection
                .ensure_network_up(&creds.network.ssid, &creds.network.password)
                .await;
        let session_up = network_up
            && self.connection.session_link().first_attempt_succeeded()
            && self
                .connection
                .ensure_session_up(&creds.session, &self.config.broker)
                .await;
        debug!(
            "[STATION] Connectivity: network={} session={}",
            network_up, session_up
        );

        let Some(source) = self.source.as_mut() else {
            // Ready is only reached after the sensors came up
            self.transition(StationEvent::CycleFinished);
            return None;
        };
        let reading = source.read();
        log_reading(&reading);

        let telemetry = if session_up {
            SinkOutcome::from_delivery(
                self.telemetry
                    .publish(&reading, self.connection.session_mut())
                    .await,
            )
        } else {
            SinkOutcome::Skipped
        };

        let notify = if network_up {
            SinkOutcome::from_delivery(self.notifier.notify(&reading).await)
        } else {
            SinkOutcome::Skipped
        };

        self.transition(StationEvent::CycleFinished);
        debug!(
            "[STATION] Cycle {} done: telemetry {:?}, notify {:?}",
            self.cycles_completed(),
            telemetry,
            notify
        );
        Some(CycleReport {
            network_up,
            session_up,
            reading,
            telemetry,
            notify,
        })
    }

    /// Run measurement cycles forever, one every `cycle_period`.
    ///
    /// A disabled station parks here without doing any further work.
    pub async fn run(&mut self) {
        info!(
            "[STATION] Measuring every {:?}, publishing to {}",
            self.config.cycle_period,
            self.telemetry.topic()
        );
        loop {
            if self.run_cycle().await.is_none() {
                warn!("[STATION] Station is {:?}; no further measurements will be taken", self.state());
                std::future::pending::<()>().await;
            }
            sleep(self.config.cycle_period).await;
        }
    }

    fn transition(&mut self, event: StationEvent) {
        let from = self.lifecycle.state();
        match self.lifecycle.process_event(event) {
            TransitionResult::Success(to) => {
                debug_assert!(is_valid_transition(from, to));
                if from != to {
                    debug!("[STATION] {:?} -> {:?}", from, to);
                }
            }
            TransitionResult::Invalid { from, event } => {
                warn!("[STATION] Ignoring {:?} while {:?}", event, from);
            }
        }
    }
}
