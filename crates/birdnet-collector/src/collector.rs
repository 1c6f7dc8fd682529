use crate::debounce::{Category, Debouncer};
use crate::{disk, rates, thermal};
use birdnet_metrics_core::{Counters, Snapshot};
use birdnet_metrics_store::MetricsStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{Disks, System};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Caller-supplied CPU usage sampler, injected rather than sampled
/// in-process so the host can coordinate a single CPU reader across
/// everything that needs one.
pub type CpuFn = Box<dyn Fn() -> f64 + Send + Sync>;

/// Per-tick driver that samples CPU, memory, temperature, disk, and
/// database metrics and pushes one batch to the store.
///
/// `prev_disk_io` and `prev_db_snapshot` are mutated only by [`Collector::run`]
/// — a single instance is not expected to run concurrently with itself, so
/// no locking protects them.
pub struct Collector {
    store: MetricsStore,
    cpu_fn: Option<CpuFn>,
    counters: Option<Arc<Counters>>,
    interval: Duration,
    debouncer: Debouncer,
    system: System,
    prev_disk_io: Option<(HashMap<String, (u64, u64)>, Instant)>,
    prev_db_snapshot: Option<(Snapshot, Instant)>,
}

impl Collector {
    /// Build a collector that will push batches to `store` every `interval`.
    ///
    /// `cpu_fn`, when supplied, is called once per tick to produce
    /// `cpu.total`. `counters`, when supplied, enables the `db.*` metrics.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero or negative-equivalent — a
    /// misconfigured cadence is a construction-time bug, not a condition
    /// to recover from at runtime.
    #[must_use]
    pub fn new(store: MetricsStore, interval: Duration, cpu_fn: Option<CpuFn>, counters: Option<Arc<Counters>>) -> Self {
        assert!(!interval.is_zero(), "Collector interval must be positive");
        Self {
            store,
            cpu_fn,
            counters,
            interval,
            debouncer: Debouncer::default(),
            system: System::new(),
            prev_disk_io: None,
            prev_db_snapshot: None,
        }
    }

    /// Run the collector until `token` is cancelled: one immediate
    /// collection, then a tick every `interval`. Returns on the next loop
    /// iteration after cancellation, draining no pending work.
    pub async fn run(mut self, token: CancellationToken) {
        self.tick();

        let mut ticker = tokio::time::interval(self.interval);
        ticker.tick().await; // the first tick() call above already covered the immediate collection

        loop {
            tokio::select! {
                () = token.cancelled() => return,
                _ = ticker.tick() => self.tick(),
            }
        }
    }

    /// Assemble and record exactly one batch.
    fn tick(&mut self) {
        let now = Instant::now();
        let mut batch: HashMap<String, f64> = HashMap::new();

        if let Some(cpu_fn) = &self.cpu_fn {
            batch.insert("cpu.total".to_string(), cpu_fn());
        }

        self.system.refresh_memory();
        let total_memory = self.system.total_memory();
        if total_memory > 0 {
            #[allow(clippy::cast_precision_loss)]
            let used_percent = self.system.used_memory() as f64 / total_memory as f64 * 100.0;
            batch.insert("memory.used_percent".to_string(), used_percent);
        } else {
            self.debouncer.once(Category::Memory, || {
                warn!("memory stats unavailable on this platform, skipping memory.used_percent");
            });
        }

        if let Some(temperature) = thermal::sample_cpu_temperature() {
            batch.insert("cpu.temperature".to_string(), temperature);
        }

        let disks = Disks::new_with_refreshed_list();
        if disks.list().is_empty() {
            self.debouncer.once(Category::DiskList, || {
                warn!("no disks reported by this platform, skipping disk.used_percent.*");
            });
        }
        for (name, used_percent) in disk::sample_usage(&disks) {
            batch.insert(format!("disk.used_percent.{name}"), used_percent);
        }

        let current_io = disk::sample_cumulative_io(&disks);
        if current_io.is_empty() {
            self.debouncer.once(Category::DiskIo, || {
                warn!("no disk I/O counters available on this platform, skipping disk.io.*");
            });
        }
        let io_previous = self
            .prev_disk_io
            .as_ref()
            .map(|(prev, prev_time)| (prev, now.duration_since(*prev_time)));
        batch.extend(rates::disk_io_metrics(&current_io, io_previous));
        self.prev_disk_io = Some((current_io, now));

        if let Some(counters) = &self.counters {
            let snapshot = counters.snapshot();
            let db_previous = self
                .prev_db_snapshot
                .map(|(prev, prev_time)| (prev, now.duration_since(prev_time)));
            batch.extend(rates::db_metrics(snapshot, db_previous));
            self.prev_db_snapshot = Some((snapshot, now));
        }

        if !batch.is_empty() {
            self.store.record_batch(&batch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn immediate_collection_happens_before_first_tick() {
        let store = MetricsStore::new(16);
        let cpu_fn: CpuFn = Box::new(|| 42.0);
        let collector = Collector::new(store.clone(), Duration::from_secs(3600), Some(cpu_fn), None);

        let token = CancellationToken::new();
        let token_clone = token.clone();
        let handle = tokio::spawn(collector.run(token_clone));

        // Give the spawned task a scheduling slot to run its immediate tick.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(store.get_latest()["cpu.total"].value, 42.0);

        token.cancel();
        handle.await.unwrap();
    }

    #[test]
    #[should_panic(expected = "interval must be positive")]
    fn zero_interval_panics() {
        let store = MetricsStore::new(16);
        let _ = Collector::new(store, Duration::ZERO, None, None);
    }

    #[test]
    fn first_tick_attaches_counters_but_no_rate_metrics_yet() {
        let store = MetricsStore::new(16);
        let counters = Arc::new(Counters::new());
        counters.record_read(5_000);
        let mut collector = Collector::new(store.clone(), Duration::from_secs(3600), None, Some(counters));

        collector.tick();

        let latest = store.get_latest();
        assert!(latest.contains_key("db.read_latency_max_ms"));
        assert!(!latest.contains_key("db.queries_per_sec"));
    }

    #[test]
    fn second_tick_with_activity_emits_query_rate() {
        let store = MetricsStore::new(16);
        let counters = Arc::new(Counters::new());
        let mut collector = Collector::new(store.clone(), Duration::from_secs(3600), None, Some(Arc::clone(&counters)));

        collector.tick();
        for _ in 0..50 {
            counters.record_read(5_000);
        }
        for _ in 0..10 {
            counters.record_write(10_000);
        }
        // Force a deterministic elapsed time rather than sleeping.
        collector.prev_db_snapshot = collector
            .prev_db_snapshot
            .map(|(snap, t)| (snap, t - Duration::from_secs(5)));
        collector.tick();

        let latest = store.get_latest();
        // Elapsed time is shifted back by exactly 5s but still includes the
        // real (sub-millisecond) time the test itself took, so compare with
        // a tolerance rather than bit-for-bit equality.
        assert!((latest["db.queries_per_sec"].value - 12.0).abs() < 0.01);
        assert_eq!(latest["db.read_latency_ms"].value, 5.0);
        assert_eq!(latest["db.write_latency_ms"].value, 10.0);
    }
}
