//! # envstat-core
//!
//! **A small environmental station: one sensor, one set of numbers everyone agrees on.**
//!
//! `envstat-core` keeps the live state of a temperature/humidity monitor: the
//! current reading, running min/max/average, a rolling history for charts,
//! battery classification and a system health snapshot. It knows nothing about
//! HTTP; `envstat-server` puts a web dashboard in front of it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use envstat_core::{ServiceConfig, SimulatedSensor, TelemetryService};
//!
//! let service = TelemetryService::new(
//!     ServiceConfig::default(),
//!     Box::new(SimulatedSensor::new(7)),
//! );
//! service.record_sample().unwrap();
//!
//! let data = service.current_data().unwrap();
//! println!(
//!     "{:.1}°C (min {:.1}, max {:.1})",
//!     data.reading.temperature, data.statistics.min_temp, data.statistics.max_temp
//! );
//! ```
//!
//! ## Architecture
//!
//! Sensor → TelemetryService (stats + history + battery, one lock) → snapshots
//!
//! Every hardware dependency sits behind a trait: [`SensorSource`] for the
//! climate sensor, [`PowerProbe`] for the battery, [`HostProbe`] for memory
//! and CPU, and [`NetworkProbe`] for the network identity. Readers only ever
//! receive owned snapshots, so a request never observes a half-applied sample.
//!
//! [`LogRelay`] is independent of the service. It fans log lines out to live
//! dashboard consoles with one bounded queue per subscriber.

pub mod battery;
pub mod comfort;
pub mod config;
pub mod error;
pub mod health;
pub mod history;
pub mod host;
pub mod network;
pub mod power;
pub mod reading;
pub mod relay;
pub mod sensor;
pub mod service;
pub mod stats;

pub use battery::{
    BatteryClassifier, BatteryConfig, BatteryLevel, BatteryMonitor, BatteryStatus, PowerSample,
    PowerSource,
};
pub use comfort::{DerivedMetrics, dew_point, heat_index};
pub use config::{
    DEFAULT_NETWORK_CHECK_INTERVAL, DEFAULT_SAMPLE_INTERVAL, DEFAULT_STALE_AFTER,
    DEFAULT_STATUS_INTERVAL, ServiceConfig,
};
pub use error::{SensorError, TelemetryError};
pub use health::{
    NetworkInfo, SystemHealth, SystemHealthCollector, format_bytes, format_percent, format_rssi,
    format_uptime,
};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryBuffer, HistoryEntry, HistorySnapshot};
pub use host::{HostProbe, HostSample, ProcHostProbe, StaticHostProbe};
pub use network::{LocalAddrProbe, NetworkProbe, StaticNetwork, detect_local_ip};
pub use power::{PowerProbe, SimulatedPower, SysfsPowerProbe};
pub use reading::Reading;
pub use relay::{LogRelay, SubscriberId, Subscription};
pub use sensor::{ReplaySensor, SensorSource, SimulatedSensor};
pub use service::{BatteryReport, DataSnapshot, TelemetryService};
pub use stats::{Statistics, StatisticsEngine, StatsSnapshot};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
