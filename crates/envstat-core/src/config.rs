//! Service configuration.

use std::time::Duration;

use crate::battery::BatteryConfig;
use crate::health::NetworkInfo;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::relay::{DEFAULT_LOG_CAPACITY, DEFAULT_SUBSCRIBER_QUEUE};

/// Default sensor polling interval.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(3000);
/// A reading older than this is no longer served as current.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);
/// How often the network identity is re-checked.
pub const DEFAULT_NETWORK_CHECK_INTERVAL: Duration = Duration::from_secs(10);
/// How often a one-line status summary is logged.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Number of samples retained for the history chart.
    pub history_capacity: usize,
    pub sample_interval: Duration,
    pub stale_after: Duration,
    pub network_check_interval: Duration,
    pub status_interval: Duration,
    /// Lines kept in the log relay for late subscribers.
    pub log_capacity: usize,
    pub subscriber_queue: usize,
    pub battery: BatteryConfig,
    pub network: NetworkInfo,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
            network_check_interval: DEFAULT_NETWORK_CHECK_INTERVAL,
            status_interval: DEFAULT_STATUS_INTERVAL,
            log_capacity: DEFAULT_LOG_CAPACITY,
            subscriber_queue: DEFAULT_SUBSCRIBER_QUEUE,
            battery: BatteryConfig::default(),
            network: NetworkInfo::default(),
        }
    }
}
