//! Telemetry service façade.
//!
//! One [`TelemetryService`] owns all live telemetry state behind a single
//! mutex. Each public operation takes the lock for at most one snapshot copy
//! or one logical update; sensor, power and host I/O always happen outside it.
//!
//! ```no_run
//! use std::sync::Arc;
//! use envstat_core::{ServiceConfig, SimulatedSensor, TelemetryService};
//!
//! let service = Arc::new(TelemetryService::new(
//!     ServiceConfig::default(),
//!     Box::new(SimulatedSensor::new(42)),
//! ));
//! service.record_sample().unwrap();
//! let data = service.current_data().unwrap();
//! assert!(data.statistics.min_temp <= data.reading.temperature);
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::battery::{BatteryMonitor, BatteryStatus};
use crate::comfort::DerivedMetrics;
use crate::config::ServiceConfig;
use crate::error::{SensorError, TelemetryError};
use crate::health::{
    SystemHealth, SystemHealthCollector, format_bytes, format_percent, format_rssi, format_uptime,
};
use crate::history::{HistoryBuffer, HistoryEntry, HistorySnapshot, time_of_day_label};
use crate::host::{HostProbe, StaticHostProbe};
use crate::network::NetworkProbe;
use crate::power::PowerProbe;
use crate::reading::Reading;
use crate::sensor::SensorSource;
use crate::stats::{Statistics, StatisticsEngine};

/// Consistent view of the current reading and its statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataSnapshot {
    pub reading: Reading,
    pub statistics: Statistics,
    pub derived: DerivedMetrics,
    pub battery: BatteryStatus,
    /// Readings admitted since start.
    pub samples: u64,
    /// Milliseconds since service start at which the snapshot was taken; always ≥ 1.
    pub timestamp: u64,
}

/// Battery status plus bookkeeping for the `/battery` view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReport {
    pub status: BatteryStatus,
    /// Milliseconds since start of the last power sample.
    pub last_update_ms: u64,
    pub read_count: u64,
}

struct ServiceState {
    stats: StatisticsEngine,
    history: HistoryBuffer,
    battery: BatteryMonitor,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub struct TelemetryService {
    config: ServiceConfig,
    sensor: Mutex<Box<dyn SensorSource>>,
    power: Option<Mutex<Box<dyn PowerProbe>>>,
    host: Box<dyn HostProbe>,
    network: Option<Box<dyn NetworkProbe>>,
    state: Mutex<ServiceState>,
    health: SystemHealthCollector,
    started: Instant,
    started_unix_ms: u64,
}

impl TelemetryService {
    /// Create a service with no power probe and a zeroed host probe.
    pub fn new(config: ServiceConfig, sensor: Box<dyn SensorSource>) -> Self {
        let state = ServiceState {
            stats: StatisticsEngine::new(),
            history: HistoryBuffer::new(config.history_capacity),
            battery: BatteryMonitor::new(config.battery.clone()),
        };
        Self {
            health: SystemHealthCollector::new(config.network.clone()),
            sensor: Mutex::new(sensor),
            power: None,
            host: Box::new(StaticHostProbe::default()),
            network: None,
            state: Mutex::new(state),
            started: Instant::now(),
            started_unix_ms: unix_ms_now(),
            config,
        }
    }

    pub fn with_power(mut self, probe: Box<dyn PowerProbe>) -> Self {
        self.power = Some(Mutex::new(probe));
        self
    }

    pub fn with_host(mut self, probe: Box<dyn HostProbe>) -> Self {
        self.host = probe;
        self
    }

    pub fn with_network(mut self, probe: Box<dyn NetworkProbe>) -> Self {
        self.network = Some(probe);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn health(&self) -> &SystemHealthCollector {
        &self.health
    }

    pub fn sensor_name(&self) -> String {
        lock(&self.sensor).name().to_string()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    fn uptime_ms(&self) -> u64 {
        (self.started.elapsed().as_millis() as u64).max(1)
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        lock(&self.state)
    }

    /// Pull one reading from the sensor and admit it.
    ///
    /// Statistics and history are updated together under one lock. On failure
    /// the error counter is bumped and the previous state stays intact.
    pub fn record_sample(&self) -> Result<Reading, SensorError> {
        let raw = lock(&self.sensor).read();
        let now = self.uptime_ms();
        let admitted = raw.and_then(|(t, h)| {
            let reading = Reading::new(t, h, now);
            self.admit(reading).map(|stats| (reading, stats))
        });

        match admitted {
            Ok((reading, stats)) => {
                log::info!(
                    "T: {:.1}°C | H: {:.1}% | Avg: T={:.1}°C H={:.1}%",
                    reading.temperature,
                    reading.humidity,
                    stats.avg_temp,
                    stats.avg_humid
                );
                Ok(reading)
            }
            Err(err) => {
                self.health.record_error();
                log::warn!("✗ Sensor reading error: {err}");
                Err(err)
            }
        }
    }

    /// Returns the statistics as they stood right after this reading.
    fn admit(&self, reading: Reading) -> Result<Statistics, SensorError> {
        let label = time_of_day_label(self.started_unix_ms + reading.timestamp_millis);
        let mut state = self.lock_state();
        state.stats.update(reading)?;
        state.history.push(HistoryEntry {
            label,
            temp: reading.temperature,
            humid: reading.humidity,
        });
        Ok(state.stats.statistics())
    }

    /// Sample the power probe, if one is configured, and reclassify the battery.
    pub fn record_power(&self) -> Option<BatteryStatus> {
        let probe = self.power.as_ref()?;
        let Some(sample) = lock(probe).sample() else {
            log::debug!("power probe returned no sample");
            return None;
        };
        let now = self.uptime_ms();
        let status = self.lock_state().battery.update(sample, now);
        if status.is_low {
            log::warn!("Battery: {}", status.summary());
        } else {
            log::debug!("Battery: {}", status.summary());
        }
        Some(status)
    }

    /// Current reading, statistics and derived metrics from one critical section.
    ///
    /// Fails with [`TelemetryError::NoReading`] before the first good sample and
    /// with [`TelemetryError::Stale`] once the last good sample is too old.
    pub fn current_data(&self) -> Result<DataSnapshot, TelemetryError> {
        let now = self.uptime_ms();
        let (snap, battery) = {
            let state = self.lock_state();
            (state.stats.snapshot(), state.battery.status())
        };

        let reading = snap.reading.ok_or(TelemetryError::NoReading)?;
        let age_ms = now.saturating_sub(reading.timestamp_millis);
        if age_ms >= self.config.stale_after.as_millis() as u64 {
            return Err(TelemetryError::Stale { age_ms });
        }

        Ok(DataSnapshot {
            reading,
            statistics: snap.statistics,
            derived: snap.derived,
            battery,
            samples: snap.samples,
            timestamp: now,
        })
    }

    /// Whether `current_data` would currently succeed.
    pub fn is_sensor_valid(&self) -> bool {
        self.current_data().is_ok()
    }

    pub fn current_stats(&self) -> SystemHealth {
        let host = self.host.sample();
        let battery = self.lock_state().battery.status();
        self.health.collect(self.uptime().as_secs(), &host, battery)
    }

    /// Re-read the network identity. Returns `true` if it changed.
    pub fn check_network(&self) -> bool {
        let Some(probe) = self.network.as_ref() else {
            return false;
        };
        let Some(info) = probe.sample() else {
            log::warn!("WiFi: no network address, waiting for reconnect");
            return false;
        };
        if info == self.health.network() {
            return false;
        }
        log::info!(
            "WiFi: {} ({}, {})",
            info.ssid,
            info.ip_address,
            format_rssi(info.rssi_dbm)
        );
        self.health.set_network(info);
        true
    }

    /// One-line summary of uptime, network, climate, CPU, memory and traffic.
    pub fn status_line(&self) -> String {
        let health = self.current_stats();
        let reading = self.lock_state().stats.snapshot().reading;
        let climate = match reading {
            Some(r) => format!("T: {:.1}°C H: {:.1}%", r.temperature, r.humidity),
            None => "T: -- H: --".to_string(),
        };
        format!(
            "Uptime: {} | WiFi: {} ({}) {} | {} | CPU: {} | Heap: {} free ({} used) | Requests: {}",
            format_uptime(health.uptime_seconds),
            health.ssid,
            format_rssi(health.rssi_dbm),
            health.ip_address,
            climate,
            format_percent(health.cpu_usage_percent),
            format_bytes(health.free_heap_bytes),
            format_percent(health.heap_usage_percent),
            health.request_count
        )
    }

    pub fn current_history(&self) -> HistorySnapshot {
        self.lock_state().history.snapshot()
    }

    pub fn battery_report(&self) -> BatteryReport {
        let state = self.lock_state();
        BatteryReport {
            status: state.battery.status(),
            last_update_ms: state.battery.last_update_ms(),
            read_count: state.battery.read_count(),
        }
    }

    /// Snap min/max to the current reading. Averages and history are kept.
    ///
    /// Before the first reading there is nothing to snap to and the
    /// statistics stay zeroed.
    pub fn reset(&self) {
        if self.lock_state().stats.reset() {
            log::info!("✓ Min/Max have been reset");
        } else {
            log::info!("✓ Min/Max reset (no reading yet)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::{BatteryLevel, PowerSample};
    use crate::health::NetworkInfo;
    use crate::host::HostSample;
    use crate::sensor::ReplaySensor;

    struct FlakyPower {
        samples: Vec<Option<PowerSample>>,
    }

    impl PowerProbe for FlakyPower {
        fn sample(&mut self) -> Option<PowerSample> {
            if self.samples.is_empty() {
                None
            } else {
                self.samples.remove(0)
            }
        }
    }

    fn service(readings: Vec<(f64, f64)>) -> TelemetryService {
        TelemetryService::new(
            ServiceConfig::default(),
            Box::new(ReplaySensor::from_readings(readings)),
        )
    }

    #[test]
    fn no_reading_before_first_sample() {
        let svc = service(vec![(20.0, 50.0)]);
        assert_eq!(svc.current_data(), Err(TelemetryError::NoReading));
        assert!(!svc.is_sensor_valid());
        assert!(svc.current_history().is_empty());
    }

    #[test]
    fn sample_updates_stats_and_history_together() {
        let svc = service(vec![(23.5, 55.0), (25.0, 50.0)]);
        svc.record_sample().unwrap();
        svc.record_sample().unwrap();

        let data = svc.current_data().unwrap();
        assert_eq!(data.reading.temperature, 25.0);
        assert_eq!(data.statistics.max_temp, 25.0);
        assert_eq!(data.statistics.min_temp, 23.5);
        assert_eq!(data.statistics.max_humid, 55.0);
        assert_eq!(data.statistics.min_humid, 50.0);
        assert_eq!(data.samples, 2);
        assert!(data.timestamp >= 1);

        let hist = svc.current_history();
        assert_eq!(hist.temp, vec![23.5, 25.0]);
        assert_eq!(hist.humid, vec![55.0, 50.0]);
        assert_eq!(hist.labels.len(), 2);
    }

    #[test]
    fn sensor_failure_counts_error_and_keeps_state() {
        let svc = TelemetryService::new(
            ServiceConfig::default(),
            Box::new(ReplaySensor::new(vec![
                Ok((21.0, 45.0)),
                Err(SensorError::Unavailable("i2c timeout".into())),
                Ok((150.0, 45.0)),
            ])),
        );
        svc.record_sample().unwrap();
        let before = svc.current_data().unwrap();

        assert!(svc.record_sample().is_err());
        assert!(matches!(
            svc.record_sample(),
            Err(SensorError::OutOfRange { .. })
        ));

        let after = svc.current_data().unwrap();
        assert_eq!(after.reading, before.reading);
        assert_eq!(after.statistics, before.statistics);
        assert_eq!(svc.current_history().len(), 1);
        assert_eq!(svc.current_stats().error_count, 2);
    }

    #[test]
    fn reset_snaps_to_current_reading() {
        let svc = service(vec![(18.0, 40.0), (26.0, 70.0), (22.0, 55.0)]);
        for _ in 0..3 {
            svc.record_sample().unwrap();
        }
        svc.reset();
        let data = svc.current_data().unwrap();
        assert_eq!(data.statistics.min_temp, 22.0);
        assert_eq!(data.statistics.max_temp, 22.0);
        assert_eq!(data.statistics.min_humid, 55.0);
        assert_eq!(data.statistics.max_humid, 55.0);
        assert!((data.statistics.avg_temp - 22.0).abs() < 1e-9);
        assert_eq!(svc.current_history().len(), 3);
    }

    #[test]
    fn reset_before_first_reading_keeps_zeroed_stats() {
        let svc = service(vec![(20.0, 50.0)]);
        svc.reset();
        assert_eq!(svc.current_data(), Err(TelemetryError::NoReading));

        svc.record_sample().unwrap();
        let data = svc.current_data().unwrap();
        assert_eq!(data.statistics.min_temp, 20.0);
        assert_eq!(data.statistics.max_temp, 20.0);
    }

    #[test]
    fn history_capacity_never_exceeds_sixty() {
        let config = ServiceConfig {
            history_capacity: 100,
            ..ServiceConfig::default()
        };
        let readings: Vec<_> = (0..100).map(|i| (20.0 + i as f64 * 0.1, 50.0)).collect();
        let svc = TelemetryService::new(config, Box::new(ReplaySensor::from_readings(readings)));
        for _ in 0..100 {
            svc.record_sample().unwrap();
        }
        let hist = svc.current_history();
        assert_eq!(hist.len(), 60);
        assert_eq!(hist.temp.len(), 60);
        assert_eq!(hist.humid.len(), 60);
    }

    #[test]
    fn reading_exactly_at_stale_limit_is_stale() {
        let config = ServiceConfig {
            stale_after: Duration::ZERO,
            ..ServiceConfig::default()
        };
        let svc = TelemetryService::new(
            config,
            Box::new(ReplaySensor::from_readings([(20.0, 50.0)])),
        );
        svc.record_sample().unwrap();
        assert!(matches!(
            svc.current_data(),
            Err(TelemetryError::Stale { .. })
        ));
    }

    #[test]
    fn stale_reading_is_not_served() {
        let config = ServiceConfig {
            stale_after: Duration::from_millis(1),
            ..ServiceConfig::default()
        };
        let svc = TelemetryService::new(
            config,
            Box::new(ReplaySensor::from_readings([(20.0, 50.0)])),
        );
        svc.record_sample().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(matches!(
            svc.current_data(),
            Err(TelemetryError::Stale { .. })
        ));
    }

    #[test]
    fn power_probe_feeds_battery() {
        let svc = service(vec![(20.0, 50.0)]).with_power(Box::new(FlakyPower {
            samples: vec![
                Some(PowerSample {
                    voltage: 3.3,
                    usb_powered: false,
                }),
                None,
            ],
        }));
        let status = svc.record_power().unwrap();
        assert_eq!(status.status, BatteryLevel::Low);
        assert!(svc.record_power().is_none());

        let report = svc.battery_report();
        assert_eq!(report.read_count, 1);
        assert!(report.status.is_low);
        assert!(svc.current_stats().battery.is_low);

        svc.record_sample().unwrap();
        assert!(svc.current_data().unwrap().battery.is_low);
    }

    #[test]
    fn no_power_probe_means_default_battery() {
        let svc = service(vec![(20.0, 50.0)]);
        assert!(svc.record_power().is_none());
        assert_eq!(svc.battery_report().read_count, 0);
    }

    #[test]
    fn stats_use_host_probe_and_counters() {
        let svc = service(vec![(20.0, 50.0)]).with_host(Box::new(StaticHostProbe::new(
            HostSample {
                free_heap_bytes: 100,
                total_heap_bytes: 400,
                cpu_usage_percent: 12.5,
            },
        )));
        svc.health().record_request();
        let stats = svc.current_stats();
        assert_eq!(stats.heap_usage_percent, 75.0);
        assert_eq!(stats.cpu_usage_percent, 12.5);
        assert_eq!(stats.request_count, 1);
        assert_eq!(stats.ssid, "offline");
    }

    struct SwitchingNetwork {
        answers: Mutex<Vec<Option<NetworkInfo>>>,
    }

    impl NetworkProbe for SwitchingNetwork {
        fn sample(&self) -> Option<NetworkInfo> {
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                None
            } else {
                answers.remove(0)
            }
        }
    }

    #[test]
    fn network_check_follows_changes() {
        let home = NetworkInfo::new("home", -55, "192.168.1.40");
        let moved = NetworkInfo::new("home", -70, "192.168.1.77");
        let svc = TelemetryService::new(
            ServiceConfig {
                network: home.clone(),
                ..ServiceConfig::default()
            },
            Box::new(ReplaySensor::from_readings([(20.0, 50.0)])),
        )
        .with_network(Box::new(SwitchingNetwork {
            answers: Mutex::new(vec![Some(home.clone()), None, Some(moved.clone())]),
        }));

        assert!(!svc.check_network());
        assert!(!svc.check_network());
        assert_eq!(svc.health().network(), home);
        assert!(svc.check_network());
        assert_eq!(svc.health().network(), moved);
        assert_eq!(svc.current_stats().ip_address, "192.168.1.77");
    }

    #[test]
    fn network_check_without_probe_is_noop() {
        let svc = service(vec![(20.0, 50.0)]);
        assert!(!svc.check_network());
    }

    #[test]
    fn status_line_summarises_service() {
        let svc = TelemetryService::new(
            ServiceConfig {
                network: NetworkInfo::new("lab-net", -67, "10.1.2.3"),
                ..ServiceConfig::default()
            },
            Box::new(ReplaySensor::from_readings([(23.46, 55.0)])),
        )
        .with_host(Box::new(StaticHostProbe::new(HostSample {
            free_heap_bytes: 2048,
            total_heap_bytes: 8192,
            cpu_usage_percent: 7.3,
        })));

        assert!(svc.status_line().contains("T: -- H: --"));

        svc.record_sample().unwrap();
        svc.health().record_request();
        let line = svc.status_line();
        assert!(line.starts_with("Uptime: 00:00:"));
        assert!(line.contains("WiFi: lab-net (-67 dBm) 10.1.2.3"));
        assert!(line.contains("T: 23.5°C H: 55.0%"));
        assert!(line.contains("CPU: 7.3%"));
        assert!(line.contains("Heap: 2.0 KB free (75.0% used)"));
        assert!(line.ends_with("Requests: 1"));
    }
}
