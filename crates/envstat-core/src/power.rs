//! Power supply probes feeding the battery monitor.

use std::path::{Path, PathBuf};

use crate::battery::PowerSample;

/// Reads the battery voltage and whether external (USB) power is present.
pub trait PowerProbe: Send {
    /// `None` when the hardware could not be read this cycle.
    fn sample(&mut self) -> Option<PowerSample>;
}

/// Fixed or linearly draining battery.
#[derive(Debug, Clone)]
pub struct SimulatedPower {
    voltage: f64,
    usb_powered: bool,
    drain_per_sample: f64,
    floor: f64,
}

impl SimulatedPower {
    pub fn fixed(voltage: f64, usb_powered: bool) -> Self {
        Self {
            voltage,
            usb_powered,
            drain_per_sample: 0.0,
            floor: 0.0,
        }
    }

    /// Lose `drain_per_sample` volts per call, never going below `floor`.
    pub fn draining(voltage: f64, drain_per_sample: f64, floor: f64) -> Self {
        Self {
            voltage,
            usb_powered: false,
            drain_per_sample,
            floor,
        }
    }
}

impl PowerProbe for SimulatedPower {
    fn sample(&mut self) -> Option<PowerSample> {
        let sample = PowerSample {
            voltage: self.voltage,
            usb_powered: self.usb_powered,
        };
        if !self.usb_powered {
            self.voltage = (self.voltage - self.drain_per_sample).max(self.floor);
        }
        Some(sample)
    }
}

/// Linux `/sys/class/power_supply` reader.
///
/// The first supply of type `Battery` provides `voltage_now` (µV); any online
/// supply of type `Mains` or `USB` marks the device as externally powered.
#[derive(Debug, Clone)]
pub struct SysfsPowerProbe {
    root: PathBuf,
}

impl SysfsPowerProbe {
    pub fn new() -> Self {
        Self::with_root("/sys/class/power_supply")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for SysfsPowerProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let v = raw.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

impl PowerProbe for SysfsPowerProbe {
    fn sample(&mut self) -> Option<PowerSample> {
        let entries = std::fs::read_dir(&self.root).ok()?;
        let mut voltage = None;
        let mut usb_powered = false;

        for entry in entries.flatten() {
            let dir = entry.path();
            let Some(kind) = read_trimmed(&dir.join("type")) else {
                continue;
            };
            match kind.as_str() {
                "Battery" if voltage.is_none() => {
                    voltage = read_trimmed(&dir.join("voltage_now"))
                        .and_then(|v| v.parse::<f64>().ok())
                        .map(|uv| uv / 1_000_000.0);
                }
                "Mains" | "USB" => {
                    if read_trimmed(&dir.join("online")).as_deref() == Some("1") {
                        usb_powered = true;
                    }
                }
                _ => {}
            }
        }

        // A machine on mains without a battery still reports power state.
        if voltage.is_none() && !usb_powered {
            return None;
        }
        Some(PowerSample {
            voltage: voltage.unwrap_or(0.0),
            usb_powered,
        })
    }
}
