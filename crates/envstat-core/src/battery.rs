//! Battery voltage classification.
//!
//! [`BatteryClassifier::classify`] is a pure mapping from one voltage sample
//! to a [`BatteryStatus`]. [`BatteryMonitor`] wraps it with the little state a
//! real ADC needs: spike rejection and a falling-voltage check for charging.

use serde::Serialize;

/// Li-ion 18650 open-circuit discharge curve, `(volts, percent)`, full to empty.
pub const LI_ION_DISCHARGE_CURVE: &[(f64, f64)] = &[
    (4.20, 100.0),
    (4.10, 95.0),
    (4.00, 88.0),
    (3.90, 78.0),
    (3.80, 65.0),
    (3.70, 50.0),
    (3.60, 35.0),
    (3.50, 20.0),
    (3.40, 10.0),
    (3.30, 5.0),
    (3.00, 0.0),
];

/// Upper bound for any reported voltage.
pub const MAX_REPORTED_VOLTAGE: f64 = 5.0;

/// Charge level bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BatteryLevel {
    #[default]
    Normal,
    Low,
    Critical,
}

impl std::fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Low => write!(f, "Low"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// Where the device is drawing power from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PowerSource {
    #[default]
    Battery,
    #[serde(rename = "USB")]
    Usb,
}

impl std::fmt::Display for PowerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Battery => write!(f, "Battery"),
            Self::Usb => write!(f, "USB"),
        }
    }
}

/// Classified battery state.
///
/// Invariants: `is_critical ⇒ is_low`, `is_low ⇒ status != Normal`,
/// `is_usb ⇔ source == Usb`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatteryStatus {
    pub voltage: f64,
    pub percent: u8,
    pub status: BatteryLevel,
    pub source: PowerSource,
    pub is_charging: bool,
    pub is_usb: bool,
    pub is_low: bool,
    pub is_critical: bool,
}

impl BatteryStatus {
    /// One-line summary for logs, e.g. `3.85V | 72% | Discharging (Battery)`.
    pub fn summary(&self) -> String {
        let state = if self.is_charging {
            "Charging"
        } else if self.is_usb {
            "Charged"
        } else {
            "Discharging"
        };
        let mut s = format!(
            "{:.2}V | {}% | {state} ({})",
            self.voltage, self.percent, self.source
        );
        if self.is_critical {
            s.push_str(" ‼ CRITICAL");
        } else if self.is_low {
            s.push_str(" ⚠ LOW");
        }
        s
    }
}

/// Voltage thresholds for classification.
#[derive(Debug, Clone)]
pub struct BatteryConfig {
    /// At or below this the battery reads 0 %.
    pub empty_voltage: f64,
    /// At or above this the battery reads 100 %.
    pub full_voltage: f64,
    /// Below this (on battery power) the battery is `Low`.
    pub low_voltage: f64,
    /// Below this (on battery power) the battery is `Critical`.
    pub critical_voltage: f64,
    /// Accepted jump between consecutive samples before a sample is treated as a spike.
    pub spike_threshold: f64,
    /// Piecewise-linear `(volts, percent)` curve, ordered full to empty.
    pub curve: &'static [(f64, f64)],
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            empty_voltage: 3.0,
            full_voltage: 4.2,
            low_voltage: 3.4,
            critical_voltage: 3.2,
            spike_threshold: 0.5,
            curve: LI_ION_DISCHARGE_CURVE,
        }
    }
}

/// Pure voltage → status mapping.
#[derive(Debug, Clone, Default)]
pub struct BatteryClassifier {
    config: BatteryConfig,
}

impl BatteryClassifier {
    pub fn new(config: BatteryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    /// State of charge in percent, clamped to `[0, 100]`, monotonic in voltage.
    pub fn percent(&self, voltage: f64) -> u8 {
        let cfg = &self.config;
        if !voltage.is_finite() || voltage <= cfg.empty_voltage {
            return 0;
        }
        if voltage >= cfg.full_voltage {
            return 100;
        }

        let pct = cfg
            .curve
            .windows(2)
            .find_map(|w| {
                let (v_high, p_high) = w[0];
                let (v_low, p_low) = w[1];
                if voltage > v_high || voltage <= v_low {
                    return None;
                }
                let range = v_high - v_low;
                if range <= 1e-4 {
                    return Some(p_low);
                }
                Some(p_low + (voltage - v_low) / range * (p_high - p_low))
            })
            // Curve does not cover this voltage: fall back to a straight line.
            .unwrap_or_else(|| {
                100.0 * (voltage - cfg.empty_voltage) / (cfg.full_voltage - cfg.empty_voltage)
            });

        pct.clamp(0.0, 100.0).round() as u8
    }

    /// Classify one voltage sample.
    ///
    /// On USB power the battery is never flagged low; charging is assumed
    /// while the voltage has not yet reached full.
    pub fn classify(&self, voltage: f64, is_usb_powered: bool) -> BatteryStatus {
        let cfg = &self.config;
        let voltage = if voltage.is_finite() {
            voltage.clamp(0.0, MAX_REPORTED_VOLTAGE)
        } else {
            0.0
        };

        let on_battery = !is_usb_powered && voltage > 0.0;
        let is_critical = on_battery && voltage < cfg.critical_voltage;
        let is_low = is_critical || (on_battery && voltage < cfg.low_voltage);
        let status = if is_critical {
            BatteryLevel::Critical
        } else if is_low {
            BatteryLevel::Low
        } else {
            BatteryLevel::Normal
        };

        BatteryStatus {
            voltage,
            percent: self.percent(voltage),
            status,
            source: if is_usb_powered {
                PowerSource::Usb
            } else {
                PowerSource::Battery
            },
            is_charging: is_usb_powered && voltage > 0.0 && voltage < cfg.full_voltage,
            is_usb: is_usb_powered,
            is_low,
            is_critical,
        }
    }
}

/// Raw power reading from the ADC / power-supply driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSample {
    pub voltage: f64,
    pub usb_powered: bool,
}

/// Stateful wrapper around [`BatteryClassifier`].
#[derive(Debug, Clone, Default)]
pub struct BatteryMonitor {
    classifier: BatteryClassifier,
    last_voltage: Option<f64>,
    status: BatteryStatus,
    read_count: u64,
    last_update_ms: u64,
}

impl BatteryMonitor {
    pub fn new(config: BatteryConfig) -> Self {
        Self {
            classifier: BatteryClassifier::new(config),
            ..Self::default()
        }
    }

    /// Feed one sample and return the new classification.
    pub fn update(&mut self, sample: PowerSample, now_ms: u64) -> BatteryStatus {
        let mut voltage = sample.voltage;
        if let Some(prev) = self.last_voltage
            && prev > 0.0
            && (voltage - prev).abs() > self.classifier.config().spike_threshold
        {
            log::debug!("ignoring battery voltage spike {prev:.2}V -> {voltage:.2}V");
            voltage = prev;
        }

        let mut status = self.classifier.classify(voltage, sample.usb_powered);
        if status.is_charging
            && let Some(prev) = self.last_voltage
            && status.voltage < prev - 0.01
        {
            status.is_charging = false;
        }

        self.last_voltage = Some(status.voltage);
        self.status = status;
        self.read_count += 1;
        self.last_update_ms = now_ms;
        status
    }

    pub fn status(&self) -> BatteryStatus {
        self.status
    }

    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    pub fn last_update_ms(&self) -> u64 {
        self.last_update_ms
    }
}
