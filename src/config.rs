//! Station configuration
//!
//! Defaults match the deployed station. Every field can be overridden from
//! `STATION_*` environment variables.

use crate::connection::RetryPolicy;
use crate::transport::{Endpoint, SessionCredentials};
use station_shared::{cycle, thingspeak};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_WIFI_SSID: &str = "STATION_WIFI_SSID";
pub const ENV_WIFI_PASSWORD: &str = "STATION_WIFI_PASSWORD";
pub const ENV_MQTT_CLIENT_ID: &str = "STATION_MQTT_CLIENT_ID";
pub const ENV_MQTT_USERNAME: &str = "STATION_MQTT_USERNAME";
pub const ENV_MQTT_PASSWORD: &str = "STATION_MQTT_PASSWORD";
pub const ENV_MQTT_HOST: &str = "STATION_MQTT_HOST";
pub const ENV_MQTT_PORT: &str = "STATION_MQTT_PORT";
pub const ENV_CHANNEL_ID: &str = "STATION_CHANNEL_ID";
pub const ENV_WEBHOOK_URL: &str = "STATION_WEBHOOK_URL";
pub const ENV_CYCLE_SECS: &str = "STATION_CYCLE_SECS";
pub const ENV_PROBE_ADDR: &str = "STATION_PROBE_ADDR";
pub const ENV_MODE: &str = "STATION_MODE";

/// MQTT client id used unless `STATION_MQTT_CLIENT_ID` is set
pub const DEFAULT_CLIENT_ID: &str = "weather-station";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must not be zero")]
    Zero { key: &'static str },

    #[error("unknown station mode {0:?} (expected \"host\" or \"simulated\")")]
    UnknownMode(String),
}

/// Network name and passphrase
#[derive(Clone, Default)]
pub struct NetworkCredentials {
    pub ssid: String,
    pub password: String,
}

impl fmt::Debug for NetworkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the station needs to authenticate against its services
#[derive(Debug, Clone)]
pub struct Credentials {
    pub network: NetworkCredentials,
    pub session: SessionCredentials,
    pub channel_id: u64,
    pub webhook_url: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            network: NetworkCredentials::default(),
            session: SessionCredentials {
                client_id: DEFAULT_CLIENT_ID.to_string(),
                username: String::new(),
                password: String::new(),
            },
            channel_id: thingspeak::DEFAULT_CHANNEL_ID,
            webhook_url: String::new(),
        }
    }
}

/// Which adapters back the transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationMode {
    /// Real sockets: TCP probe, MQTT broker, HTTP webhook
    Host,
    /// In-process transports, nothing leaves the machine
    Simulated,
}

impl FromStr for StationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(StationMode::Host),
            "simulated" | "sim" => Ok(StationMode::Simulated),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for StationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationMode::Host => write!(f, "host"),
            StationMode::Simulated => write!(f, "simulated"),
        }
    }
}

/// Station configuration
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub credentials: Credentials,
    /// MQTT broker of the telemetry service
    pub broker: Endpoint,
    /// Time between the end of one cycle and the start of the next
    pub cycle_period: Duration,
    pub retry: RetryPolicy,
    /// Address the host network link probes to decide it is connected
    pub probe_address: String,
    pub probe_timeout: Duration,
    pub mode: StationMode,
    pub http_timeout: Duration,
    pub mqtt_timeout: Duration,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            broker: Endpoint::new(thingspeak::BROKER_HOST, thingspeak::BROKER_PORT),
            cycle_period: Duration::from_millis(cycle::CYCLE_PERIOD_MS),
            retry: RetryPolicy::default(),
            probe_address: format!("{}:{}", thingspeak::BROKER_HOST, thingspeak::BROKER_PORT),
            probe_timeout: Duration::from_secs(3),
            mode: StationMode::Simulated,
            http_timeout: Duration::from_secs(10),
            mqtt_timeout: Duration::from_secs(10),
        }
    }
}

impl StationConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let creds = &mut config.credentials;

        if let Some(v) = lookup(ENV_WIFI_SSID) {
            creds.network.ssid = v;
        }
        if let Some(v) = lookup(ENV_WIFI_PASSWORD) {
            creds.network.password = v;
        }
        if let Some(v) = lookup(ENV_MQTT_CLIENT_ID) {
            creds.session.client_id = v;
        }
        if let Some(v) = lookup(ENV_MQTT_USERNAME) {
            creds.session.username = v;
        }
        if let Some(v) = lookup(ENV_MQTT_PASSWORD) {
            creds.session.password = v;
        }
        if let Some(v) = lookup(ENV_CHANNEL_ID) {
            creds.channel_id = parse_number(ENV_CHANNEL_ID, &v)?;
        }
        if let Some(v) = lookup(ENV_WEBHOOK_URL) {
            creds.webhook_url = v;
        }
        if let Some(v) = lookup(ENV_MQTT_HOST) {
            config.broker.host = v;
        }
        if let Some(v) = lookup(ENV_MQTT_PORT) {
            config.broker.port = parse_number(ENV_MQTT_PORT, &v)?;
        }
        if let Some(v) = lookup(ENV_CYCLE_SECS) {
            let secs: u64 = parse_number(ENV_CYCLE_SECS, &v)?;
            if secs == 0 {
                return Err(ConfigError::Zero {
                    key: ENV_CYCLE_SECS,
                });
            }
            config.cycle_period = Duration::from_secs(secs);
        }
        if let Some(v) = lookup(ENV_PROBE_ADDR) {
            config.probe_address = v;
        }
        if let Some(v) = lookup(ENV_MODE) {
            config.mode = v.parse()?;
        }

        Ok(config)
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StationConfig::default();
        assert_eq!(config.broker.to_string(), "mqtt3.thingspeak.com:1883");
        assert_eq!(config.credentials.channel_id, 1973314);
        assert_eq!(config.cycle_period, Duration::from_secs(15));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.mode, StationMode::Simulated);
        assert_eq!(config.credentials.session.client_id, DEFAULT_CLIENT_ID);
    }

    #[test]
    fn test_env_overrides() {
        let config = StationConfig::from_lookup(lookup(&[
            (ENV_WIFI_SSID, "lab"),
            (ENV_WIFI_PASSWORD, "secret"),
            (ENV_MQTT_CLIENT_ID, "station-1"),
            (ENV_MQTT_HOST, "broker.local"),
            (ENV_MQTT_PORT, "1884"),
            (ENV_CHANNEL_ID, "42"),
            (ENV_WEBHOOK_URL, "https://hooks.local/abc"),
            (ENV_CYCLE_SECS, "30"),
            (ENV_MODE, "Host"),
        ]))
        .unwrap();

        assert_eq!(config.credentials.network.ssid, "lab");
        assert_eq!(config.credentials.network.password, "secret");
        assert_eq!(config.credentials.session.client_id, "station-1");
        assert_eq!(config.broker, Endpoint::new("broker.local", 1884));
        assert_eq!(config.credentials.channel_id, 42);
        assert_eq!(config.credentials.webhook_url, "https://hooks.local/abc");
        assert_eq!(config.cycle_period, Duration::from_secs(30));
        assert_eq!(config.mode, StationMode::Host);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            StationConfig::from_lookup(lookup(&[(ENV_MQTT_PORT, "70000")])).unwrap_err(),
            ConfigError::InvalidNumber {
                key: ENV_MQTT_PORT,
                value: "70000".into()
            }
        );
        assert_eq!(
            StationConfig::from_lookup(lookup(&[(ENV_CYCLE_SECS, "0")])).unwrap_err(),
            ConfigError::Zero {
                key: ENV_CYCLE_SECS
            }
        );
        assert!(matches!(
            StationConfig::from_lookup(lookup(&[(ENV_MODE, "radio")])),
            Err(ConfigError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let config = StationConfig::from_lookup(lookup(&[
            (ENV_WIFI_PASSWORD, "wifi-pass"),
            (ENV_MQTT_PASSWORD, "mqtt-pass"),
        ]))
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("wifi-pass"));
        assert!(!debug.contains("mqtt-pass"));
    }
}
