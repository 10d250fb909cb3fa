//! Temperature/humidity sensor sources.
//!
//! Every driver implements [`SensorSource`]. Two software sources ship with the
//! crate: a seeded random walk for demos and a replay source for scripted runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SensorError;

/// Something that yields `(temperature °C, relative humidity %)` on demand.
///
/// Implementations may block for the duration of one bus transaction; the
/// service never calls `read` while holding its state lock.
pub trait SensorSource: Send {
    /// Short identifier for logs (e.g. `"aht10"`).
    fn name(&self) -> &str;

    fn read(&mut self) -> Result<(f64, f64), SensorError>;
}

/// Random walk around a comfortable indoor climate.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    rng: StdRng,
    temperature: f64,
    humidity: f64,
}

impl SimulatedSensor {
    pub fn new(seed: u64) -> Self {
        Self::starting_at(seed, 22.0, 50.0)
    }

    pub fn starting_at(seed: u64, temperature: f64, humidity: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            temperature,
            humidity,
        }
    }
}

impl SensorSource for SimulatedSensor {
    fn name(&self) -> &str {
        "simulated"
    }

    fn read(&mut self) -> Result<(f64, f64), SensorError> {
        self.temperature =
            (self.temperature + self.rng.random_range(-0.3..=0.3)).clamp(10.0, 35.0);
        self.humidity = (self.humidity + self.rng.random_range(-1.0..=1.0)).clamp(20.0, 80.0);
        Ok((round2(self.temperature), round2(self.humidity)))
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Plays back a fixed script of outcomes, cycling when it reaches the end.
#[derive(Debug, Clone)]
pub struct ReplaySensor {
    script: Vec<Result<(f64, f64), SensorError>>,
    position: usize,
}

impl ReplaySensor {
    pub fn new(script: Vec<Result<(f64, f64), SensorError>>) -> Self {
        Self {
            script,
            position: 0,
        }
    }

    pub fn from_readings(readings: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self::new(readings.into_iter().map(Ok).collect())
    }
}

impl SensorSource for ReplaySensor {
    fn name(&self) -> &str {
        "replay"
    }

    fn read(&mut self) -> Result<(f64, f64), SensorError> {
        if self.script.is_empty() {
            return Err(SensorError::Unavailable("replay script is empty".into()));
        }
        let outcome = self.script[self.position % self.script.len()].clone();
        self.position += 1;
        outcome
    }
}
