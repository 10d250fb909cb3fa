pub mod probe;
pub mod server;

use std::time::Duration;

use clap::Args;
use clap::builder::RangedU64ValueParser;
use envstat_core::{
    DEFAULT_HISTORY_CAPACITY, HostProbe, LocalAddrProbe, NetworkInfo, ProcHostProbe,
    ReplaySensor, SensorSource, ServiceConfig, SimulatedPower, SimulatedSensor, StaticHostProbe,
    SysfsPowerProbe, TelemetryService, detect_local_ip,
};

/// Where readings, power and host figures come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Sensor source
    #[arg(long, default_value = "simulated", value_parser = ["simulated", "replay"])]
    pub sensor: String,

    /// Seed for the simulated sensor
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Readings for the replay sensor as `temp:humid` pairs, e.g. "22.5:50,23:51.5"
    #[arg(long)]
    pub replay: Option<String>,

    /// Sampling interval in milliseconds
    #[arg(long, default_value = "3000")]
    pub interval_ms: u64,

    /// Number of samples kept for the history chart (1-60)
    #[arg(
        long,
        default_value = "60",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=DEFAULT_HISTORY_CAPACITY as u64)
    )]
    pub history: usize,

    /// Seconds after which the last reading is considered stale
    #[arg(long, default_value = "60")]
    pub stale_after_secs: u64,

    /// Power source: none, simulated (fixed voltage) or sysfs (/sys/class/power_supply)
    #[arg(long, default_value = "none", value_parser = ["none", "simulated", "sysfs"])]
    pub power: String,

    /// Battery voltage for --power simulated
    #[arg(long, default_value = "3.9")]
    pub battery_voltage: f64,

    /// Report USB power for --power simulated
    #[arg(long)]
    pub usb: bool,

    /// Host metrics: proc (/proc/meminfo, /proc/stat) or static (zeros)
    #[arg(long, default_value = "proc", value_parser = ["proc", "static"])]
    pub host_metrics: String,

    /// Network name shown on the dashboard
    #[arg(long)]
    pub ssid: Option<String>,

    /// Signal strength in dBm shown on the dashboard
    #[arg(long, default_value = "-100", allow_hyphen_values = true)]
    pub rssi: i32,

    /// IP address shown on the dashboard (default: detected, re-checked every 10 s)
    #[arg(long)]
    pub ip: Option<String>,
}

/// Parse `"t:h,t:h,..."` into reading pairs.
pub fn parse_replay(spec: &str) -> Result<Vec<(f64, f64)>, String> {
    spec.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (t, h) = pair
                .split_once(':')
                .ok_or_else(|| format!("invalid replay pair '{pair}', expected temp:humid"))?;
            let t = t
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid temperature in '{pair}': {e}"))?;
            let h = h
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid humidity in '{pair}': {e}"))?;
            Ok((t, h))
        })
        .collect()
}

fn make_sensor(args: &SourceArgs) -> Result<Box<dyn SensorSource>, String> {
    match args.sensor.as_str() {
        "replay" => {
            let spec = args
                .replay
                .as_deref()
                .ok_or("--sensor replay requires --replay temp:humid,...")?;
            let readings = parse_replay(spec)?;
            if readings.is_empty() {
                return Err("--replay contains no readings".into());
            }
            Ok(Box::new(ReplaySensor::from_readings(readings)))
        }
        _ => Ok(Box::new(SimulatedSensor::new(args.seed))),
    }
}

pub fn make_config(args: &SourceArgs) -> ServiceConfig {
    let network = match (&args.ssid, &args.ip) {
        (None, None) => match detect_local_ip() {
            Some(ip) => NetworkInfo::new("wired", 0, ip),
            None => NetworkInfo::default(),
        },
        (ssid, ip) => NetworkInfo::new(
            ssid.clone().unwrap_or_else(|| "offline".to_string()),
            args.rssi,
            ip.clone()
                .or_else(detect_local_ip)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
        ),
    };

    ServiceConfig {
        history_capacity: args.history,
        sample_interval: Duration::from_millis(args.interval_ms),
        stale_after: Duration::from_secs(args.stale_after_secs),
        network,
        ..ServiceConfig::default()
    }
}

/// Build the telemetry service described by the command line.
pub fn build_service(args: &SourceArgs) -> Result<TelemetryService, String> {
    let sensor = make_sensor(args)?;
    let host: Box<dyn HostProbe> = match args.host_metrics.as_str() {
        "static" => Box::new(StaticHostProbe::default()),
        _ => Box::new(ProcHostProbe::new()),
    };

    let config = make_config(args);
    let mut service = TelemetryService::new(config.clone(), sensor).with_host(host);
    // An explicit --ip pins the identity; otherwise follow the outbound address.
    if args.ip.is_none() {
        let probe = LocalAddrProbe::new(config.network.ssid, config.network.rssi_dbm);
        service = service.with_network(Box::new(probe));
    }
    let service = match args.power.as_str() {
        "simulated" => {
            service.with_power(Box::new(SimulatedPower::fixed(args.battery_voltage, args.usb)))
        }
        "sysfs" => service.with_power(Box::new(SysfsPowerProbe::new())),
        _ => service,
    };
    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_spec_parses_pairs() {
        assert_eq!(
            parse_replay("22.5:50, 23:51.5,").unwrap(),
            vec![(22.5, 50.0), (23.0, 51.5)]
        );
    }

    #[derive(clap::Parser)]
    struct SourceOnly {
        #[command(flatten)]
        source: SourceArgs,
    }

    fn parse(args: &[&str]) -> Result<SourceArgs, clap::Error> {
        use clap::Parser;
        let argv = std::iter::once("envstat").chain(args.iter().copied());
        SourceOnly::try_parse_from(argv).map(|parsed| parsed.source)
    }

    #[test]
    fn history_is_limited_to_sixty() {
        assert_eq!(parse(&[]).unwrap().history, 60);
        assert_eq!(parse(&["--history", "30"]).unwrap().history, 30);
        assert!(parse(&["--history", "61"]).is_err());
        assert!(parse(&["--history", "0"]).is_err());
    }

    #[test]
    fn explicit_ip_pins_network_identity() {
        let args = parse(&["--ssid", "lab", "--rssi", "-61", "--ip", "10.9.8.7"]).unwrap();
        let config = make_config(&args);
        assert_eq!(config.network, NetworkInfo::new("lab", -61, "10.9.8.7"));

        let service = build_service(&args).unwrap();
        assert!(!service.check_network());
        assert_eq!(service.health().network().ip_address, "10.9.8.7");
    }

    #[test]
    fn replay_spec_rejects_garbage() {
        assert!(parse_replay("22.5").is_err());
        assert!(parse_replay("warm:50").is_err());
        assert!(parse_replay("20:wet").is_err());
    }
}
