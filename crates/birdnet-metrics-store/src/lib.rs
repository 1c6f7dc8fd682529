//! Concurrent multi-series metrics store and non-blocking subscription
//! broadcaster.
//!
//! The data map and the subscriber list are guarded by two separate locks
//! (`std::sync::RwLock` / `std::sync::Mutex`) rather than one, so a slow
//! subscriber never contends with the hot record path: `record_batch`
//! releases the data lock before it ever touches the subscriber list.

#![forbid(unsafe_code)]

use birdnet_metrics_core::{MetricPoint, RingBuffer};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;

/// A snapshot of every known metric's most recent point, broadcast once per
/// `RecordBatch` call. Cheap to clone (`Arc`) so every subscriber sees the
/// byte-equal map the just-completed batch installed.
pub type LatestSnapshot = Arc<HashMap<String, MetricPoint>>;

struct Subscription {
    id: u64,
    sender: mpsc::Sender<LatestSnapshot>,
}

/// Handle returned by [`MetricsStore::subscribe`]. Dropping it does nothing;
/// call [`Cancel::cancel`] explicitly to deregister — this mirrors the
/// specification's requirement that cancellation never closes the channel,
/// which would otherwise race a still-in-flight broadcast send.
pub struct Cancel {
    id: u64,
    store: Arc<Inner>,
}

impl Cancel {
    pub fn cancel(self) {
        let mut subs = self.store.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subs.retain(|s| s.id != self.id);
    }
}

struct Inner {
    series: RwLock<HashMap<String, RingBuffer>>,
    subscribers: Mutex<Vec<Subscription>>,
    next_subscriber_id: AtomicU64,
    capacity: usize,
}

/// Concurrent mapping from metric name to its ring buffer, plus a set of
/// subscriber channels fed on every [`MetricsStore::record_batch`].
#[derive(Clone)]
pub struct MetricsStore {
    inner: Arc<Inner>,
}

impl MetricsStore {
    /// Create a store whose ring buffers are created lazily on first write,
    /// each sized to `capacity` samples.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                series: RwLock::new(HashMap::new()),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber_id: AtomicU64::new(0),
                capacity,
            }),
        }
    }

    /// Atomically record one value per name and broadcast the resulting
    /// latest-value snapshot to every current subscriber.
    ///
    /// Ring buffers for names seen for the first time are created under the
    /// same write-lock acquisition that installs their first sample. The
    /// broadcast snapshot reflects exactly this call's state, never a later
    /// one, because it is built before the write lock is released.
    pub fn record_batch(&self, points: &HashMap<String, f64>) {
        if points.is_empty() {
            return;
        }

        let snapshot = {
            let mut series = self.inner.series.write().unwrap_or_else(|e| e.into_inner());
            for (name, value) in points {
                let point = MetricPoint::now(*value);
                series
                    .entry(name.clone())
                    .or_insert_with(|| RingBuffer::new(self.inner.capacity))
                    .write(point);
            }
            let latest: HashMap<String, MetricPoint> = series
                .iter()
                .filter_map(|(name, rb)| rb.latest().map(|p| (name.clone(), p)))
                .collect();
            Arc::new(latest)
        };

        let subs = self.inner.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        for sub in subs.iter() {
            // Non-blocking by construction: capacity-1 channel, try_send
            // drops the new snapshot for this subscriber alone on Full.
            let _ = sub.sender.try_send(Arc::clone(&snapshot));
        }
    }

    /// Last `n` samples of `name`, oldest first. Unknown names return an
    /// empty vec, never an error. `n == 0` means "all available".
    #[must_use]
    pub fn get(&self, name: &str, n: usize) -> Vec<MetricPoint> {
        let series = self.inner.series.read().unwrap_or_else(|e| e.into_inner());
        series.get(name).map(|rb| rb.read(n)).unwrap_or_default()
    }

    /// Last `n` samples of every known series. Series with zero samples are
    /// omitted.
    #[must_use]
    pub fn get_all(&self, n: usize) -> HashMap<String, Vec<MetricPoint>> {
        let series = self.inner.series.read().unwrap_or_else(|e| e.into_inner());
        series
            .iter()
            .filter_map(|(name, rb)| {
                let points = rb.read(n);
                (!points.is_empty()).then(|| (name.clone(), points))
            })
            .collect()
    }

    /// Most recent sample of every known series.
    #[must_use]
    pub fn get_latest(&self) -> HashMap<String, MetricPoint> {
        let series = self.inner.series.read().unwrap_or_else(|e| e.into_inner());
        series
            .iter()
            .filter_map(|(name, rb)| rb.latest().map(|p| (name.clone(), p)))
            .collect()
    }

    /// Sorted list of known metric names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let series = self.inner.series.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = series.keys().cloned().collect();
        names.sort();
        names
    }

    /// Register a new subscriber. The returned receiver has capacity 1; the
    /// store holds the send end. The caller must call [`Cancel::cancel`] to
    /// deregister — dropping the receiver alone leaves the registration (and
    /// its doomed sends) in place, same as the legacy "cancel never closes
    /// the channel" contract.
    #[must_use]
    pub fn subscribe(&self) -> (mpsc::Receiver<LatestSnapshot>, Cancel) {
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(1);
        let mut subs = self.inner.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subs.push(Subscription { id, sender: tx });
        (
            rx,
            Cancel {
                id,
                store: Arc::clone(&self.inner),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn get_latest_reflects_just_completed_batch() {
        let store = MetricsStore::new(10);
        store.record_batch(&batch(&[("cpu.total", 42.0), ("memory.used_percent", 55.0)]));
        let latest = store.get_latest();
        assert_eq!(latest["cpu.total"].value, 42.0);
        assert_eq!(latest["memory.used_percent"].value, 55.0);
    }

    #[test]
    fn unknown_name_returns_empty_not_error() {
        let store = MetricsStore::new(10);
        assert!(store.get("nope", 5).is_empty());
        assert!(!store.get_latest().contains_key("nope"));
    }

    #[test]
    fn absent_metric_in_later_batch_keeps_prior_samples() {
        let store = MetricsStore::new(10);
        store.record_batch(&batch(&[("cpu.total", 1.0), ("memory.used_percent", 2.0)]));
        store.record_batch(&batch(&[("cpu.total", 3.0)]));
        assert_eq!(store.get("memory.used_percent", 0).len(), 1);
        assert_eq!(store.get("cpu.total", 0).len(), 2);
    }

    #[tokio::test]
    async fn subscriber_drops_snapshot_under_backpressure_not_producer() {
        let store = MetricsStore::new(10);
        let (mut rx, cancel) = store.subscribe();

        store.record_batch(&batch(&[("cpu", 1.0)]));
        store.record_batch(&batch(&[("cpu", 2.0)]));
        store.record_batch(&batch(&[("cpu", 3.0)]));

        let first = rx.try_recv().expect("one value should be buffered");
        assert_eq!(first["cpu"].value, 1.0);
        assert!(rx.try_recv().is_err(), "channel should be empty after the single buffered value");

        cancel.cancel();
    }

    #[tokio::test]
    async fn two_subscribers_see_byte_equal_snapshots() {
        let store = MetricsStore::new(10);
        let (mut rx_a, cancel_a) = store.subscribe();
        let (mut rx_b, cancel_b) = store.subscribe();

        store.record_batch(&batch(&[("cpu.total", 7.0)]));

        let a = rx_a.try_recv().unwrap();
        let b = rx_b.try_recv().unwrap();
        assert_eq!(*a, *b);

        cancel_a.cancel();
        cancel_b.cancel();
    }

    #[tokio::test]
    async fn cancel_during_broadcast_does_not_error() {
        let store = MetricsStore::new(10);
        let (rx, cancel) = store.subscribe();
        cancel.cancel();
        drop(rx);
        // A send after cancellation simply finds no subscribers; must not panic.
        store.record_batch(&batch(&[("cpu.total", 1.0)]));
    }

    #[test]
    fn names_are_sorted() {
        let store = MetricsStore::new(10);
        store.record_batch(&batch(&[("b", 1.0), ("a", 2.0), ("c", 3.0)]));
        assert_eq!(store.names(), vec!["a", "b", "c"]);
    }
}
