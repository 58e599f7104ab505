mod config;
mod connection;
mod measure;
mod sink;
mod station;
mod transport;

#[cfg(test)]
mod testing;

use anyhow::Context;
use config::{StationConfig, StationMode};
use measure::{SimulatedLightSensor, SimulatedPressureChip, PRESSURE_CHIP_ADDRESS};
use station::Orchestrator;
use transport::{
    HttpWebhook, MqttSession, NetworkLink, ProbeNetwork, SessionLink, SimulatedNetwork,
    SimulatedSession, SimulatedWebhook, WebhookClient,
};

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = StationConfig::from_env().context("invalid station configuration")?;

    info!("Weather station starting ({} mode)", config.mode);
    info!("  Network: \"{}\"", config.credentials.network.ssid);
    info!("  Broker: {}", config.broker);
    info!("  Channel: {}", config.credentials.channel_id);
    info!("  Cycle: {:?}", config.cycle_period);

    let (network, session, webhook) = match config.mode {
        StationMode::Host => host_transports(&config)?,
        StationMode::Simulated => simulated_transports(&config),
    };

    if config.mode == StationMode::Host && config.credentials.webhook_url.is_empty() {
        warn!("No webhook URL configured; notifications will fail");
    }

    // No I2C bus on a host; the chips are always simulated
    warn!("Using simulated sensor chips");
    let light = Box::new(SimulatedLightSensor::default());
    let pressure = Box::new(SimulatedPressureChip::new(PRESSURE_CHIP_ADDRESS));

    let mut station = Orchestrator::new(config, network, session, webhook);
    station.boot(light, pressure).await;
    station.run().await;

    Ok(())
}

type Transports = (
    Box<dyn NetworkLink>,
    Box<dyn SessionLink>,
    Box<dyn WebhookClient>,
);

/// Real sockets: a reachability probe, the MQTT broker and the HTTP webhook
fn host_transports(config: &StationConfig) -> anyhow::Result<Transports> {
    info!("  Network probe: {}", config.probe_address);
    let network: Box<dyn NetworkLink> = Box::new(ProbeNetwork::new(
        config.probe_address.clone(),
        config.probe_timeout,
    ));
    let session: Box<dyn SessionLink> = Box::new(MqttSession::new(config.mqtt_timeout));
    let webhook: Box<dyn WebhookClient> = Box::new(
        HttpWebhook::new(config.http_timeout).context("failed to build the webhook client")?,
    );
    Ok((network, session, webhook))
}

fn simulated_transports(config: &StationConfig) -> Transports {
    let credentials = &config.credentials.network;
    let network: Box<dyn NetworkLink> = Box::new(SimulatedNetwork::new(
        credentials.ssid.clone(),
        credentials.password.clone(),
    ));
    let session: Box<dyn SessionLink> = Box::new(SimulatedSession::new());
    let webhook: Box<dyn WebhookClient> = Box::new(SimulatedWebhook);
    (network, session, webhook)
}
