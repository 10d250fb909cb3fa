//! Process logger: env_logger to stderr, plus every record mirrored into the
//! log relay so dashboard consoles see the same lines.

use std::sync::Arc;

use envstat_core::LogRelay;
use log::{Log, Metadata, Record, SetLoggerError};

struct RelayLogger {
    inner: env_logger::Logger,
    relay: Arc<LogRelay>,
}

impl Log for RelayLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);
        self.relay
            .publish(format!("[{}] {}", record.level(), record.args()));
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the process logger. `RUST_LOG`, if set, overrides `default_filter`.
pub fn init(default_filter: &str, relay: Arc<LogRelay>) -> Result<(), SetLoggerError> {
    let inner = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .build();
    let max_level = inner.filter();
    log::set_boxed_logger(Box::new(RelayLogger { inner, relay }))?;
    log::set_max_level(max_level);
    Ok(())
}
