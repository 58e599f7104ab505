//! Sensor access
//!
//! Driver traits for the two chips, the measurement source that owns them,
//! and simulated chips for development hosts.

mod sensors;
mod simulated;
mod source;

pub use sensors::{
    Filter, LightSensor, OperatingMode, Oversampling, PressureSensor, SamplingProfile,
    SensorError, Standby, PRESSURE_CHIP_ADDRESS,
};
pub use simulated::{SimulatedLightSensor, SimulatedPressureChip};
pub use source::{log_reading, MeasurementSource};
