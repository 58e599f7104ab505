//! Sensor driver abstractions
//!
//! The station talks to two chips on the I²C bus: an ambient light sensor
//! and a combined temperature/pressure chip.

use anyhow::Result;
use thiserror::Error;

/// I²C address of the temperature/pressure chip
pub const PRESSURE_CHIP_ADDRESS: u8 = 0x76;

/// Ambient light sensor driver
pub trait LightSensor: Send {
    /// Power up the sensor and start continuous measurement
    fn begin(&mut self) -> Result<()>;

    /// Current light level in lux
    fn read_light_level(&mut self) -> f32;
}

/// Temperature/pressure chip driver
pub trait PressureSensor: Send {
    /// Probe the chip at `address` and load its calibration
    fn begin(&mut self, address: u8) -> Result<()>;

    fn set_sampling(&mut self, profile: SamplingProfile);

    /// Current temperature in °C
    fn read_temperature(&mut self) -> f32;

    /// Current pressure in Pa
    fn read_pressure(&mut self) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    Sleep,
    Forced,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oversampling {
    Skipped,
    X1,
    X2,
    X4,
    X8,
    X16,
}

/// IIR filter coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Off,
    X2,
    X4,
    X8,
    X16,
}

/// Inactive time between measurements in normal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standby {
    Ms1,
    Ms63,
    Ms125,
    Ms250,
    Ms500,
    Ms1000,
    Ms2000,
    Ms4000,
}

/// Sampling configuration for the pressure chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingProfile {
    pub mode: OperatingMode,
    pub temperature: Oversampling,
    pub pressure: Oversampling,
    pub filter: Filter,
    pub standby: Standby,
}

impl SamplingProfile {
    /// Profile used by the station: continuous sampling, heavy pressure
    /// oversampling and filtering
    pub const WEATHER_STATION: SamplingProfile = SamplingProfile {
        mode: OperatingMode::Normal,
        temperature: Oversampling::X2,
        pressure: Oversampling::X16,
        filter: Filter::X16,
        standby: Standby::Ms500,
    };
}

impl Default for SamplingProfile {
    fn default() -> Self {
        Self::WEATHER_STATION
    }
}

/// Sensor initialization failures
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("light sensor failed to initialize: {0}")]
    LightInit(String),

    #[error("pressure chip at {address:#04x} failed to initialize: {reason}")]
    PressureInit { address: u8, reason: String },
}
