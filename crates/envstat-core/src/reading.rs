//! Raw temperature/humidity readings and their admission rules.

use serde::Serialize;

use crate::error::SensorError;

/// Lowest temperature the sensor can report, in °C.
pub const TEMP_MIN_VALID: f64 = -40.0;
/// Highest temperature the sensor can report, in °C.
pub const TEMP_MAX_VALID: f64 = 85.0;
/// Lowest relative humidity, in %.
pub const HUMID_MIN_VALID: f64 = 0.0;
/// Highest relative humidity, in %.
pub const HUMID_MAX_VALID: f64 = 100.0;

/// One sample from the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Milliseconds since service start at which the sample was taken.
    pub timestamp_millis: u64,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64, timestamp_millis: u64) -> Self {
        Self {
            temperature,
            humidity,
            timestamp_millis,
        }
    }

    /// Check the reading against the sensor domain.
    ///
    /// Only readings that pass are ever admitted into statistics or history.
    pub fn validate(self) -> Result<Self, SensorError> {
        if !self.temperature.is_finite() || !self.humidity.is_finite() {
            return Err(SensorError::NonFinite);
        }
        let temp_ok = (TEMP_MIN_VALID..=TEMP_MAX_VALID).contains(&self.temperature);
        let humid_ok = (HUMID_MIN_VALID..=HUMID_MAX_VALID).contains(&self.humidity);
        if !temp_ok || !humid_ok {
            return Err(SensorError::OutOfRange {
                temperature: self.temperature,
                humidity: self.humidity,
            });
        }
        Ok(self)
    }
}
