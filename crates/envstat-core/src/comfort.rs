//! Comfort indices derived from a single reading.

use serde::Serialize;

use crate::reading::Reading;

// Magnus formula constants (°C).
const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

/// Below this temperature the heat index is just the air temperature.
pub const HEAT_INDEX_THRESHOLD: f64 = 27.0;

/// Dew point and heat index for one reading.
///
/// Always recomputed from the reading that produced it; never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub dew_point: f64,
    pub heat_index: f64,
}

impl DerivedMetrics {
    pub fn from_reading(reading: &Reading) -> Self {
        Self {
            dew_point: dew_point(reading.temperature, reading.humidity),
            heat_index: heat_index(reading.temperature, reading.humidity),
        }
    }
}

/// Dew point in °C (Magnus approximation).
pub fn dew_point(temperature: f64, humidity: f64) -> f64 {
    // ln(0) is undefined.
    let rh = humidity.max(0.01) / 100.0;
    let alpha = (MAGNUS_A * temperature) / (MAGNUS_B + temperature) + rh.ln();
    (MAGNUS_B * alpha) / (MAGNUS_A - alpha)
}

/// Heat index in °C (Rothfusz regression, metric coefficients).
pub fn heat_index(temperature: f64, humidity: f64) -> f64 {
    if temperature < HEAT_INDEX_THRESHOLD {
        return temperature;
    }

    const C1: f64 = -8.784_694_755_56;
    const C2: f64 = 1.611_394_11;
    const C3: f64 = 2.338_548_838_89;
    const C4: f64 = -0.146_116_05;
    const C5: f64 = -0.012_308_094;
    const C6: f64 = -0.016_424_827_777_8;
    const C7: f64 = 0.002_211_732;
    const C8: f64 = 0.000_725_46;
    const C9: f64 = -0.000_003_582;

    let t = temperature;
    let h = humidity;
    C1 + C2 * t
        + C3 * h
        + C4 * t * h
        + C5 * t * t
        + C6 * h * h
        + C7 * t * t * h
        + C8 * t * h * h
        + C9 * t * t * h * h
}
