//! Simulated sensor chips for hosts without an I²C bus
//!
//! Values drift slowly around a base so consecutive readings differ, but the
//! sequence is fully deterministic.

use super::sensors::{LightSensor, PressureSensor, SamplingProfile};
use anyhow::{bail, Result};
use tracing::debug;

/// Drift of the n-th sample: a triangle wave between `-amplitude` and `amplitude`
fn drift(sample: u32, period: u32, amplitude: f32) -> f32 {
    let phase = (sample % period) as f32 / period as f32;
    let triangle = if phase < 0.5 {
        phase * 4.0 - 1.0
    } else {
        3.0 - phase * 4.0
    };
    triangle * amplitude
}

pub struct SimulatedLightSensor {
    base_lux: f32,
    samples: u32,
    started: bool,
}

impl SimulatedLightSensor {
    pub fn new(base_lux: f32) -> Self {
        Self {
            base_lux,
            samples: 0,
            started: false,
        }
    }
}

impl Default for SimulatedLightSensor {
    fn default() -> Self {
        Self::new(320.0)
    }
}

impl LightSensor for SimulatedLightSensor {
    fn begin(&mut self) -> Result<()> {
        self.started = true;
        debug!("[SENSOR] Simulated light sensor started");
        Ok(())
    }

    fn read_light_level(&mut self) -> f32 {
        self.samples = self.samples.wrapping_add(1);
        (self.base_lux + drift(self.samples, 40, 80.0)).max(0.0)
    }
}

pub struct SimulatedPressureChip {
    address: u8,
    base_temperature_c: f32,
    base_pressure_pa: f32,
    samples: u32,
    profile: Option<SamplingProfile>,
}

impl SimulatedPressureChip {
    /// A chip answering at `address` only
    pub fn new(address: u8) -> Self {
        Self {
            address,
            base_temperature_c: 18.5,
            base_pressure_pa: 101_325.0,
            samples: 0,
            profile: None,
        }
    }

    #[cfg(test)]
    pub fn profile(&self) -> Option<SamplingProfile> {
        self.profile
    }
}

impl PressureSensor for SimulatedPressureChip {
    fn begin(&mut self, address: u8) -> Result<()> {
        if address != self.address {
            bail!("no chip answering at {:#04x}", address);
        }
        debug!("[SENSOR] Simulated pressure chip answering at {:#04x}", address);
        Ok(())
    }

    fn set_sampling(&mut self, profile: SamplingProfile) {
        self.profile = Some(profile);
    }

    fn read_temperature(&mut self) -> f32 {
        self.samples = self.samples.wrapping_add(1);
        self.base_temperature_c + drift(self.samples, 60, 1.5)
    }

    fn read_pressure(&mut self) -> f32 {
        self.base_pressure_pa + drift(self.samples, 120, 250.0)
    }
}
