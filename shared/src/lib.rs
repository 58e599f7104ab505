//! Weather Station Shared Types
//!
//! This crate provides the reading snapshot, rounding helpers, payload codec
//! and lifecycle state machine shared by the station node.

pub mod codec;
pub mod state_machine;

/// Pascals in one bar
pub const PA_PER_BAR: f32 = 100_000.0;

/// Retry parameters for transport connection attempts
pub mod retry {
    /// Attempts per connect call before giving up
    pub const MAX_ATTEMPTS: u32 = 12;

    /// Delay between attempts (and after the final failed attempt)
    pub const ATTEMPT_DELAY_MS: u64 = 5000;

    /// How many times a "not ready" network scan is polled again
    pub const SCAN_POLL_LIMIT: u32 = 20;

    /// Delay between scan polls
    pub const SCAN_POLL_INTERVAL_MS: u64 = 200;
}

/// Measurement cycle timing
pub mod cycle {
    /// Period between two measurement cycles
    pub const CYCLE_PERIOD_MS: u64 = 15000;
}

/// Well-known telemetry service parameters
pub mod thingspeak {
    /// MQTT broker host
    pub const BROKER_HOST: &str = "mqtt3.thingspeak.com";

    /// MQTT broker port (plain TCP)
    pub const BROKER_PORT: u16 = 1883;

    /// Channel the station publishes to unless configured otherwise
    pub const DEFAULT_CHANNEL_ID: u64 = 1973314;
}

/// Round down to two decimals: `floor(x * 100) / 100`.
///
/// This truncates toward negative infinity, so `-1.005` becomes `-1.01`
/// while `1.005` becomes `1.0`. The scaling runs in f64: in f32,
/// `0.29 * 100.0` already rounds up to exactly `29.0`.
pub fn round_two_decimals(value: f32) -> f32 {
    floor_cents(f64::from(value))
}

/// Convert a raw pressure in Pascal to bar, rounded with [`round_two_decimals`]
pub fn pa_to_bar(pressure_pa: f32) -> f32 {
    floor_cents(f64::from(pressure_pa) / f64::from(PA_PER_BAR))
}

fn floor_cents(value: f64) -> f32 {
    ((value * 100.0).floor() / 100.0) as f32
}

/// One snapshot of all sensor values for a single cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    temperature_c: f32,
    light_lux: f32,
    pressure_pa: f32,
    pressure_bar: f32,
}

impl Reading {
    /// Build a reading from raw sensor values.
    ///
    /// Every value is rounded down to two decimals; the bar value is derived
    /// from the unrounded pressure.
    pub fn from_raw(temperature_c: f32, light_lux: f32, pressure_pa: f32) -> Self {
        Self {
            temperature_c: round_two_decimals(temperature_c),
            light_lux: round_two_decimals(light_lux),
            pressure_pa: round_two_decimals(pressure_pa),
            pressure_bar: pa_to_bar(pressure_pa),
        }
    }

    pub fn temperature_c(&self) -> f32 {
        self.temperature_c
    }

    pub fn light_lux(&self) -> f32 {
        self.light_lux
    }

    pub fn pressure_pa(&self) -> f32 {
        self.pressure_pa
    }

    pub fn pressure_bar(&self) -> f32 {
        self.pressure_bar
    }
}
