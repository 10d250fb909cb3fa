//! JSON wire format of the HTTP API.
//!
//! Field names are camelCase to match what the dashboard script reads.

use serde::Serialize;

use envstat_core::{
    BatteryLevel, BatteryReport, BatteryStatus, DataSnapshot, HistorySnapshot, PowerSource,
    SystemHealth, format_bytes, format_percent, format_rssi, format_uptime,
};

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// `GET /data`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    pub temperature: f64,
    pub humidity: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub min_humid: f64,
    pub max_humid: f64,
    pub avg_temp: f64,
    pub avg_humid: f64,
    pub dew_point: f64,
    pub heat_index: f64,
    pub battery: BatteryResponse,
    pub timestamp: u64,
}

impl From<&DataSnapshot> for DataResponse {
    fn from(snap: &DataSnapshot) -> Self {
        let (r, s, d) = (&snap.reading, &snap.statistics, &snap.derived);
        Self {
            temperature: round_to(r.temperature, 2),
            humidity: round_to(r.humidity, 2),
            min_temp: round_to(s.min_temp, 2),
            max_temp: round_to(s.max_temp, 2),
            min_humid: round_to(s.min_humid, 2),
            max_humid: round_to(s.max_humid, 2),
            avg_temp: round_to(s.avg_temp, 2),
            avg_humid: round_to(s.avg_humid, 2),
            dew_point: round_to(d.dew_point, 2),
            heat_index: round_to(d.heat_index, 2),
            battery: BatteryResponse::from(&snap.battery),
            timestamp: snap.timestamp,
        }
    }
}

/// Battery block shared by `/stats` and `/battery`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryResponse {
    pub voltage: f64,
    pub percent: u8,
    pub status: BatteryLevel,
    pub source: PowerSource,
    pub is_charging: bool,
    pub is_usb: bool,
    pub is_low: bool,
    pub is_critical: bool,
}

impl From<&BatteryStatus> for BatteryResponse {
    fn from(b: &BatteryStatus) -> Self {
        Self {
            voltage: round_to(b.voltage, 2),
            percent: b.percent,
            status: b.status,
            source: b.source,
            is_charging: b.is_charging,
            is_usb: b.is_usb,
            is_low: b.is_low,
            is_critical: b.is_critical,
        }
    }
}

/// `GET /battery`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryDetailResponse {
    #[serde(flatten)]
    pub battery: BatteryResponse,
    pub last_update: u64,
    pub read_count: u64,
}

impl From<&BatteryReport> for BatteryDetailResponse {
    fn from(report: &BatteryReport) -> Self {
        Self {
            battery: BatteryResponse::from(&report.status),
            last_update: report.last_update_ms,
            read_count: report.read_count,
        }
    }
}

/// `GET /stats`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub uptime: String,
    pub free_heap: String,
    pub heap_usage: String,
    pub cpu_usage: String,
    pub ssid: String,
    pub rssi: String,
    pub ip: String,
    pub requests: u64,
    pub errors: u64,
    pub battery: BatteryResponse,
}

impl From<&SystemHealth> for StatsResponse {
    fn from(h: &SystemHealth) -> Self {
        Self {
            uptime: format_uptime(h.uptime_seconds),
            free_heap: format_bytes(h.free_heap_bytes),
            heap_usage: format_percent(h.heap_usage_percent),
            cpu_usage: format_percent(h.cpu_usage_percent),
            ssid: h.ssid.clone(),
            rssi: format_rssi(h.rssi_dbm),
            ip: h.ip_address.clone(),
            requests: h.request_count,
            errors: h.error_count,
            battery: BatteryResponse::from(&h.battery),
        }
    }
}

/// `GET /history`
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub labels: Vec<String>,
    pub temp: Vec<f64>,
    pub humid: Vec<f64>,
}

impl From<HistorySnapshot> for HistoryResponse {
    fn from(snap: HistorySnapshot) -> Self {
        Self {
            labels: snap.labels,
            temp: snap.temp.into_iter().map(|v| round_to(v, 1)).collect(),
            humid: snap.humid.into_iter().map(|v| round_to(v, 1)).collect(),
        }
    }
}

/// `GET /reset`
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}
