//! Host resource probes (memory, CPU load).
//!
//! Probes are best effort: values that cannot be observed are reported as 0
//! rather than guessed.

use std::sync::Mutex;

/// Memory and CPU figures for one health report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostSample {
    pub free_heap_bytes: u64,
    pub total_heap_bytes: u64,
    /// Busy share of the CPU since the previous sample, in percent.
    pub cpu_usage_percent: f64,
}

/// Supplies host resource figures to the health collector.
pub trait HostProbe: Send + Sync {
    fn sample(&self) -> HostSample;
}

/// Returns the same figures every time. Used in tests and on hosts without procfs.
#[derive(Debug, Clone, Default)]
pub struct StaticHostProbe {
    sample: HostSample,
}

impl StaticHostProbe {
    pub fn new(sample: HostSample) -> Self {
        Self { sample }
    }
}

impl HostProbe for StaticHostProbe {
    fn sample(&self) -> HostSample {
        self.sample
    }
}

/// Reads `/proc/meminfo` and `/proc/stat`.
///
/// CPU usage is the busy ratio between two consecutive calls, so the first
/// call always reports 0.
#[derive(Debug, Default)]
pub struct ProcHostProbe {
    last_cpu: Mutex<Option<CpuTimes>>,
}

impl ProcHostProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn cpu_usage(&self, now: Option<CpuTimes>) -> f64 {
        let Some(now) = now else {
            return 0.0;
        };
        let mut last = self
            .last_cpu
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let usage = last.map_or(0.0, |prev| now.busy_percent_since(&prev));
        *last = Some(now);
        usage
    }
}

impl HostProbe for ProcHostProbe {
    fn sample(&self) -> HostSample {
        let (total, free) = std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|raw| parse_meminfo(&raw))
            .unwrap_or((0, 0));
        let cpu = std::fs::read_to_string("/proc/stat")
            .ok()
            .and_then(|raw| parse_cpu_times(&raw));
        HostSample {
            free_heap_bytes: free,
            total_heap_bytes: total,
            cpu_usage_percent: self.cpu_usage(cpu),
        }
    }
}

/// Aggregate jiffies from the `cpu ` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

impl CpuTimes {
    pub fn busy_percent_since(&self, prev: &CpuTimes) -> f64 {
        let total = self.total.saturating_sub(prev.total);
        if total == 0 {
            return 0.0;
        }
        let busy = self.busy.saturating_sub(prev.busy);
        (100.0 * busy as f64 / total as f64).clamp(0.0, 100.0)
    }
}

/// `(MemTotal, MemAvailable)` in bytes. Falls back to `MemFree` on old kernels.
pub fn parse_meminfo(raw: &str) -> Option<(u64, u64)> {
    let mut total = None;
    let mut available = None;
    let mut free = None;
    for line in raw.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(kib) = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
        else {
            continue;
        };
        match key {
            "MemTotal" => total = Some(kib * 1024),
            "MemAvailable" => available = Some(kib * 1024),
            "MemFree" => free = Some(kib * 1024),
            _ => {}
        }
    }
    Some((total?, available.or(free)?))
}

pub fn parse_cpu_times(raw: &str) -> Option<CpuTimes> {
    let rest = raw.lines().find_map(|line| line.strip_prefix("cpu "))?;
    let parts: Vec<u64> = rest
        .split_whitespace()
        .filter_map(|s| s.parse::<u64>().ok())
        .collect();
    if parts.len() < 4 {
        return None;
    }
    // user nice system idle iowait irq softirq steal ...
    let idle = parts[3] + parts.get(4).copied().unwrap_or(0);
    let total: u64 = parts.iter().take(8).sum();
    Some(CpuTimes {
        busy: total.saturating_sub(idle),
        total,
    })
}
