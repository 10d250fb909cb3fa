//! CLI for envstat — live environmental telemetry from a sensor.

mod commands;
mod logging;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use envstat_core::{LogRelay, ServiceConfig};

use commands::SourceArgs;

#[derive(Parser)]
#[command(name = "envstat")]
#[command(about = "envstat — live temperature, humidity and system health dashboard")]
#[command(version = envstat_core::VERSION)]
struct Cli {
    /// Log filter: error, warn, info, debug, trace or env_logger directives.
    /// RUST_LOG takes precedence when set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard, JSON API and /ws log stream
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Take a few samples and print data, stats and history as JSON
    Probe {
        /// Number of samples to take
        #[arg(long, default_value = "5")]
        samples: usize,

        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let defaults = ServiceConfig::default();
    let relay = Arc::new(LogRelay::new(defaults.log_capacity, defaults.subscriber_queue));
    if let Err(e) = logging::init(&cli.log_level, Arc::clone(&relay)) {
        eprintln!("Failed to initialise logging: {e}");
    }

    let result = match cli.command {
        Commands::Serve { host, port, source } => {
            commands::server::run(&host, port, &source, relay)
        }
        Commands::Probe { samples, source } => commands::probe::run(samples, &source),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
