//! Measurement source owning both sensor handles

use super::sensors::{
    LightSensor, PressureSensor, SamplingProfile, SensorError, PRESSURE_CHIP_ADDRESS,
};
use station_shared::Reading;
use tracing::{error, info};

/// Both initialized sensors, read together once per cycle
pub struct MeasurementSource {
    light: Box<dyn LightSensor>,
    pressure: Box<dyn PressureSensor>,
}

impl MeasurementSource {
    /// Initialize the light sensor, then the pressure chip.
    ///
    /// The pressure chip is not touched if the light sensor fails. On success
    /// the chip is switched to [`SamplingProfile::WEATHER_STATION`].
    pub fn initialize(
        mut light: Box<dyn LightSensor>,
        mut pressure: Box<dyn PressureSensor>,
    ) -> Result<Self, SensorError> {
        light.begin().map_err(|e| {
            error!("[SENSOR] Light sensor did not respond: {:#}", e);
            SensorError::LightInit(format!("{:#}", e))
        })?;
        info!("[SENSOR] Light sensor ready");

        pressure.begin(PRESSURE_CHIP_ADDRESS).map_err(|e| {
            error!(
                "[SENSOR] Pressure chip at {:#04x} did not respond: {:#}",
                PRESSURE_CHIP_ADDRESS, e
            );
            SensorError::PressureInit {
                address: PRESSURE_CHIP_ADDRESS,
                reason: format!("{:#}", e),
            }
        })?;
        pressure.set_sampling(SamplingProfile::WEATHER_STATION);
        info!(
            "[SENSOR] Pressure chip ready at {:#04x}",
            PRESSURE_CHIP_ADDRESS
        );

        Ok(Self { light, pressure })
    }

    /// Read both sensors and build a rounded [`Reading`]
    pub fn read(&mut self) -> Reading {
        let light_lux = self.light.read_light_level();
        let temperature_c = self.pressure.read_temperature();
        let pressure_pa = self.pressure.read_pressure();
        Reading::from_raw(temperature_c, light_lux, pressure_pa)
    }
}

/// Log a reading as a "New measurement" block
pub fn log_reading(reading: &Reading) {
    info!("[STATION] --- New measurement ---");
    info!("[STATION]   Light:       {:.2} lux", reading.light_lux());
    info!("[STATION]   Temperature: {:.2} °C", reading.temperature_c());
    info!(
        "[STATION]   Pressure:    {:.2} Pa ({:.2} bar)",
        reading.pressure_pa(),
        reading.pressure_bar()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, MockLight, MockPressure};

    #[test]
    fn test_initialize_applies_sampling_profile() {
        let log = CallLog::new();
        let pressure = MockPressure::new(&log, 20.0, 100000.0);
        let profile = pressure.profile();

        let source = MeasurementSource::initialize(
            Box::new(MockLight::new(&log, 120.0)),
            Box::new(pressure),
        );

        assert!(source.is_ok());
        assert_eq!(
            log.only(&["light.begin", "pressure.begin@0x76", "pressure.sampling"]),
            vec!["light.begin", "pressure.begin@0x76", "pressure.sampling"]
        );
        assert_eq!(
            *profile.lock().unwrap(),
            Some(SamplingProfile::WEATHER_STATION)
        );
    }

    #[test]
    fn test_light_failure_skips_pressure_chip() {
        let log = CallLog::new();
        let result = MeasurementSource::initialize(
            Box::new(MockLight::broken(&log)),
            Box::new(MockPressure::new(&log, 20.0, 100000.0)),
        );

        assert!(matches!(result, Err(SensorError::LightInit(_))));
        assert_eq!(log.count("pressure.begin@0x76"), 0);
    }

    #[test]
    fn test_pressure_failure_is_reported() {
        let log = CallLog::new();
        let result = MeasurementSource::initialize(
            Box::new(MockLight::new(&log, 120.0)),
            Box::new(MockPressure::broken(&log)),
        );

        match result {
            Err(SensorError::PressureInit { address, .. }) => assert_eq!(address, 0x76),
            _ => panic!("expected a pressure chip failure"),
        }
        assert_eq!(log.count("pressure.sampling"), 0);
    }

    #[test]
    fn test_read_rounds_every_value() {
        let log = CallLog::new();
        let mut source = MeasurementSource::initialize(
            Box::new(MockLight::new(&log, 350.789)),
            Box::new(MockPressure::new(&log, -1.005, 101325.0)),
        )
        .unwrap();

        let reading = source.read();

        assert!((reading.light_lux() - 350.78).abs() < 1e-3);
        assert!((reading.temperature_c() - -1.01).abs() < 1e-4);
        assert!((reading.pressure_bar() - 1.01).abs() < 1e-4);
        assert_eq!(log.count("sensor.read"), 1);
    }
}
