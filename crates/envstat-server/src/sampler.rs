//! Periodic background work: sampling, network re-checks and status lines.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use envstat_core::TelemetryService;

const MIN_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
enum Job {
    Sample,
    CheckNetwork,
    Status,
}

impl Job {
    fn run(self, service: &TelemetryService) {
        match self {
            Job::Sample => {
                // Failures are already counted and logged by the service.
                let _ = service.record_sample();
                service.record_power();
            }
            Job::CheckNetwork => {
                service.check_network();
            }
            Job::Status => log::info!("{}", service.status_line()),
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let period = period.max(MIN_INTERVAL);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Run the service's periodic jobs for the life of the runtime.
///
/// Intervals come from the service config. Each first tick fires one interval
/// after spawning. Jobs touch hardware and procfs, so each one runs on the
/// blocking pool, one at a time.
pub fn spawn_sampler(service: Arc<TelemetryService>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let config = service.config();
        let mut sample = ticker(config.sample_interval);
        let mut network = ticker(config.network_check_interval);
        let mut status = ticker(config.status_interval);
        loop {
            let job = tokio::select! {
                _ = sample.tick() => Job::Sample,
                _ = network.tick() => Job::CheckNetwork,
                _ = status.tick() => Job::Status,
            };
            let svc = Arc::clone(&service);
            if let Err(e) = tokio::task::spawn_blocking(move || job.run(&svc)).await {
                log::error!("{job:?} job panicked: {e}");
            }
        }
    })
}
