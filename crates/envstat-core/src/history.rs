//! Fixed-capacity ring buffer of timestamped samples for the history chart.

use std::collections::VecDeque;

use serde::Serialize;

/// Default number of retained samples (3 minutes at a 3 s interval).
pub const DEFAULT_HISTORY_CAPACITY: usize = 60;

/// One point of the history chart.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Time of day the sample was taken, `HH:MM:SS`.
    pub label: String,
    pub temp: f64,
    pub humid: f64,
}

/// The buffer as three parallel series, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySnapshot {
    pub labels: Vec<String>,
    pub temp: Vec<f64>,
    pub humid: Vec<f64>,
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// FIFO ring buffer: once full, each push evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create a buffer holding at most `capacity` entries, clamped to
    /// `1..=DEFAULT_HISTORY_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, DEFAULT_HISTORY_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let mut snap = HistorySnapshot {
            labels: Vec::with_capacity(self.entries.len()),
            temp: Vec::with_capacity(self.entries.len()),
            humid: Vec::with_capacity(self.entries.len()),
        };
        for entry in &self.entries {
            snap.labels.push(entry.label.clone());
            snap.temp.push(entry.temp);
            snap.humid.push(entry.humid);
        }
        snap
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// UTC time of day for a Unix timestamp in milliseconds, as `HH:MM:SS`.
pub fn time_of_day_label(unix_millis: u64) -> String {
    let secs = (unix_millis / 1000) % 86_400;
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
