//! Standalone runner for the Collector: starts it against an in-memory
//! store with no real database attached and prints the latest snapshot
//! as JSON on a fixed cadence, for manual inspection and local
//! smoke-testing without a host application.

#![forbid(unsafe_code)]

use birdnet_observability::{Config, Observability};
use clap::Parser;
use std::sync::Mutex;
use std::time::Duration;
use sysinfo::System;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "birdnet-metricsd", version, about = "Run the observability collector standalone and print snapshots as JSON")]
struct Cli {
    /// How often to print a snapshot, in seconds. Independent of the
    /// collector's own sampling interval (`BIRDNET_METRICS_INTERVAL_SECS`).
    #[arg(long, default_value_t = 5)]
    print_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut observability = Observability::new(Config::from_env());

    let system = Mutex::new(System::new());
    let cpu_fn: birdnet_observability::CpuFn = Box::new(move || {
        let mut system = system.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        system.refresh_cpu_usage();
        f64::from(system.global_cpu_usage())
    });
    observability.start(Some(cpu_fn));

    let store = observability.store().clone();
    let print_interval = Duration::from_secs(cli.print_interval_secs.max(1));
    let mut ticker = tokio::time::interval(print_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let latest = store.get_latest();
                match serde_json::to_string_pretty(&latest) {
                    Ok(json) => println!("{json}"),
                    Err(err) => tracing::warn!(%err, "failed to serialize metrics snapshot"),
                }
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    tracing::warn!(%err, "failed to listen for ctrl-c");
                }
                tracing::info!("shutting down on ctrl-c");
                break;
            }
        }
    }

    observability.shutdown().await;
}
