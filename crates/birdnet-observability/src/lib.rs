//! Facade wiring the observability core together: re-exports the lower
//! crates and adds an `Observability` struct that owns the `Counters` +
//! `MetricsStore` + `Collector` a host application needs, plus the
//! `birdnet-metricsd` binary for standalone inspection.

#![forbid(unsafe_code)]

mod config;

pub use birdnet_collector::{Collector, CpuFn};
pub use birdnet_db::{DbError, InstrumentedConnection};
pub use birdnet_delivery::{history, parse_filter, DeliveryError, MetricsStream, StreamEvent, DEFAULT_HEARTBEAT, DEFAULT_HISTORY_POINTS};
pub use birdnet_metrics_core::{Counters, MetricPoint, RingBuffer, Snapshot};
pub use birdnet_metrics_store::{Cancel, LatestSnapshot, MetricsStore};
pub use config::Config;

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Owns the running pieces of the observability core for a host
/// application: the shared [`Counters`] a `birdnet-db` connection records
/// into, the [`MetricsStore`] clients subscribe to, and the [`Collector`]
/// that feeds it. An owned handle rather than a process-global singleton,
/// since a host may want more than one instance (e.g. in tests).
pub struct Observability {
    counters: Arc<Counters>,
    store: MetricsStore,
    config: Config,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Observability {
    /// Build from `config`, constructing the shared [`Counters`] and
    /// [`MetricsStore`]. Does not start the collector — call [`Self::start`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            counters: Arc::new(Counters::with_slow_threshold(config.slow_query_micros)),
            store: MetricsStore::new(config.ring_capacity),
            config,
            token: CancellationToken::new(),
            handle: None,
        }
    }

    /// The counters a `birdnet-db` [`InstrumentedConnection`] should share.
    #[must_use]
    pub const fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    /// The store clients subscribe to via `birdnet-delivery`.
    #[must_use]
    pub const fn store(&self) -> &MetricsStore {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Start the collector loop, sampling every `config.interval`. A no-op
    /// if already started.
    pub fn start(&mut self, cpu_fn: Option<CpuFn>) {
        if self.handle.is_some() {
            return;
        }
        let collector = Collector::new(
            self.store.clone(),
            self.config.interval,
            cpu_fn,
            Some(Arc::clone(&self.counters)),
        );
        let token = self.token.clone();
        info!(interval_secs = self.config.interval.as_secs(), "observability collector starting");
        self.handle = Some(tokio::spawn(collector.run(token)));
    }

    /// Signal the collector to stop and wait for it to finish its current
    /// tick. A no-op if not started.
    pub async fn shutdown(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
            info!("observability collector stopped");
        }
    }
}
