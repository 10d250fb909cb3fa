//! Error taxonomy for the telemetry engine.
//!
//! Sampling errors never escape the service as fatal conditions: they are
//! logged, counted, and the last good snapshot keeps being served.

use thiserror::Error;

/// A reading could not be obtained or was rejected before reaching statistics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    /// The driver timed out or the bus reported a failure.
    #[error("sensor unavailable: {0}")]
    Unavailable(String),

    /// The driver produced NaN or an infinite value.
    #[error("sensor returned a non-finite value")]
    NonFinite,

    /// The reading lies outside the physical domain of the sensor.
    #[error("reading out of range: T={temperature:.1}°C, H={humidity:.1}%")]
    OutOfRange {
        /// Rejected temperature in °C.
        temperature: f64,
        /// Rejected relative humidity in %.
        humidity: f64,
    },
}

/// Errors surfaced by [`TelemetryService`](crate::TelemetryService) queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TelemetryError {
    /// No valid reading has been admitted since the service started.
    #[error("no valid reading has been recorded yet")]
    NoReading,

    /// The last admitted reading is older than the staleness window.
    #[error("last valid reading is stale ({age_ms} ms old)")]
    Stale {
        /// Age of the last good reading in milliseconds.
        age_ms: u64,
    },
}
