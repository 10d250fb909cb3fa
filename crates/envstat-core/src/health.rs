//! System health aggregation: counters, host resources, Wi-Fi identity and battery.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::battery::BatteryStatus;
use crate::host::HostSample;

/// Wi-Fi identity as reported by the network driver.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkInfo {
    pub ssid: String,
    /// Signal strength in dBm, always within `[-100, 0]`.
    pub rssi_dbm: i32,
    pub ip_address: String,
}

impl NetworkInfo {
    pub fn new(ssid: impl Into<String>, rssi_dbm: i32, ip_address: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            rssi_dbm: rssi_dbm.clamp(-100, 0),
            ip_address: ip_address.into(),
        }
    }
}

impl Default for NetworkInfo {
    fn default() -> Self {
        Self::new("offline", -100, "0.0.0.0")
    }
}

/// Point-in-time system health.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemHealth {
    pub uptime_seconds: u64,
    pub free_heap_bytes: u64,
    pub total_heap_bytes: u64,
    pub heap_usage_percent: f64,
    pub cpu_usage_percent: f64,
    pub ssid: String,
    pub rssi_dbm: i32,
    pub ip_address: String,
    pub request_count: u64,
    pub error_count: u64,
    pub battery: BatteryStatus,
}

/// Request/error counters plus the current network identity.
///
/// Counters are lock-free so the serving layer can bump them on every
/// request without contending with the sampler.
#[derive(Debug, Default)]
pub struct SystemHealthCollector {
    requests: AtomicU64,
    errors: AtomicU64,
    network: Mutex<NetworkInfo>,
}

impl SystemHealthCollector {
    pub fn new(network: NetworkInfo) -> Self {
        Self {
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            network: Mutex::new(network),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Replace the network identity (e.g. after a Wi-Fi reconnect).
    pub fn set_network(&self, network: NetworkInfo) {
        *self
            .network
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = network;
    }

    pub fn network(&self) -> NetworkInfo {
        self.network
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Assemble a health report from externally supplied values.
    pub fn collect(
        &self,
        uptime_seconds: u64,
        host: &HostSample,
        battery: BatteryStatus,
    ) -> SystemHealth {
        let network = self.network();
        SystemHealth {
            uptime_seconds,
            free_heap_bytes: host.free_heap_bytes,
            total_heap_bytes: host.total_heap_bytes,
            heap_usage_percent: heap_usage_percent(host.total_heap_bytes, host.free_heap_bytes),
            cpu_usage_percent: host.cpu_usage_percent.clamp(0.0, 100.0),
            ssid: network.ssid,
            rssi_dbm: network.rssi_dbm,
            ip_address: network.ip_address,
            request_count: self.request_count(),
            error_count: self.error_count(),
            battery,
        }
    }
}

/// `100 * (total - free) / total`, or 0 when the total is unknown.
pub fn heap_usage_percent(total_bytes: u64, free_bytes: u64) -> f64 {
    if total_bytes == 0 {
        return 0.0;
    }
    let used = total_bytes.saturating_sub(free_bytes);
    100.0 * used as f64 / total_bytes as f64
}

/// `HH:MM:SS`, or `Nd HH:MM:SS` once past a day.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// One decimal place followed by `%`, e.g. `12.3%`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// e.g. `-67 dBm`.
pub fn format_rssi(rssi_dbm: i32) -> String {
    format!("{rssi_dbm} dBm")
}
