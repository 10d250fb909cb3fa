//! Running statistics over admitted readings.
//!
//! Min/max tighten monotonically until [`StatisticsEngine::reset`], which snaps
//! them to the current reading. The averages are running means over every
//! admitted sample and survive a reset.

use serde::Serialize;

use crate::comfort::DerivedMetrics;
use crate::error::SensorError;
use crate::reading::Reading;

/// Min/max/average for temperature and humidity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_temp: f64,
    pub min_humid: f64,
    pub max_humid: f64,
    pub avg_humid: f64,
}

/// Immutable copy of the engine state, safe to hand to concurrent readers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatsSnapshot {
    /// Last admitted reading, if any.
    pub reading: Option<Reading>,
    pub statistics: Statistics,
    pub derived: DerivedMetrics,
    /// Number of readings admitted since start.
    pub samples: u64,
}

/// Owns the current reading, running statistics and derived metrics.
#[derive(Debug, Clone, Default)]
pub struct StatisticsEngine {
    current: Option<Reading>,
    stats: Statistics,
    derived: DerivedMetrics,
    samples: u64,
}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a reading.
    ///
    /// Invalid readings are rejected with the state untouched.
    pub fn update(&mut self, reading: Reading) -> Result<(), SensorError> {
        let reading = reading.validate()?;
        let t = reading.temperature;
        let h = reading.humidity;

        self.samples += 1;
        if self.current.is_none() {
            self.stats.min_temp = t;
            self.stats.max_temp = t;
            self.stats.min_humid = h;
            self.stats.max_humid = h;
        } else {
            self.stats.min_temp = self.stats.min_temp.min(t);
            self.stats.max_temp = self.stats.max_temp.max(t);
            self.stats.min_humid = self.stats.min_humid.min(h);
            self.stats.max_humid = self.stats.max_humid.max(h);
        }

        let n = self.samples as f64;
        self.stats.avg_temp += (t - self.stats.avg_temp) / n;
        self.stats.avg_humid += (h - self.stats.avg_humid) / n;

        self.current = Some(reading);
        self.derived = DerivedMetrics::from_reading(&reading);
        Ok(())
    }

    /// Snap min/max to the current reading.
    ///
    /// Returns `false` when there is no reading to snap to yet.
    pub fn reset(&mut self) -> bool {
        let Some(reading) = self.current else {
            return false;
        };
        self.stats.min_temp = reading.temperature;
        self.stats.max_temp = reading.temperature;
        self.stats.min_humid = reading.humidity;
        self.stats.max_humid = reading.humidity;
        true
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reading: self.current,
            statistics: self.stats,
            derived: self.derived,
            samples: self.samples,
        }
    }
}
