//! Turns a single [`MetricsStore`] subscription into the client-facing
//! event sequence the streaming endpoint contract describes: one
//! `connected` event, then `metrics`/`heartbeat` events until the
//! caller's context is cancelled or the subscription channel closes.

use crate::filter::parse_filter;
use birdnet_metrics_core::MetricPoint;
use birdnet_metrics_store::{Cancel, LatestSnapshot, MetricsStore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Interval;
use tokio_util::sync::CancellationToken;

/// Default interval between `heartbeat` events.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// One event the streaming endpoint would frame and send to its client.
///
/// `#[serde(tag = "event")]` mirrors the SSE `event:` line this type is
/// destined for once an HTTP layer frames it — that framing is out of
/// scope here, but the payload shape is part of this crate's contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Sent exactly once, immediately on subscribe.
    Connected { connection_id: String, message: String },
    /// A (possibly filtered) projection of a just-broadcast snapshot.
    Metrics(HashMap<String, MetricPoint>),
    /// Emitted every [`DEFAULT_HEARTBEAT`] (or a configured interval) of
    /// silence, carrying the current unix timestamp in seconds.
    Heartbeat { timestamp: i64 },
}

/// Adapter over one [`MetricsStore`] subscription. Each instance owns its
/// subscription and cancels it automatically on drop, so a dropped
/// connection always deregisters — the backing channel is still never
/// closed, per the store's "cancel never closes the channel" contract.
pub struct MetricsStream {
    receiver: tokio::sync::mpsc::Receiver<LatestSnapshot>,
    cancel: Option<Cancel>,
    filter: Vec<String>,
    heartbeat: Interval,
    token: CancellationToken,
    connected_sent: bool,
    connection_id: String,
}

impl MetricsStream {
    /// Subscribe to `store`. `metrics_csv` is the same comma-separated
    /// filter grammar as the historical endpoint; `token` is the request's
    /// cancellation signal.
    #[must_use]
    pub fn new(store: &MetricsStore, metrics_csv: Option<&str>, heartbeat_interval: Duration, token: CancellationToken) -> Self {
        let (receiver, cancel) = store.subscribe();
        let connection_id = format!("conn-{}", NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            receiver,
            cancel: Some(cancel),
            filter: parse_filter(metrics_csv),
            heartbeat: tokio::time::interval_at(tokio::time::Instant::now() + heartbeat_interval, heartbeat_interval),
            token,
            connected_sent: false,
            connection_id,
        }
    }

    /// Produce the next event, or `None` once the stream has ended
    /// (cancelled, or the store dropped the sending half).
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if !self.connected_sent {
            self.connected_sent = true;
            return Some(StreamEvent::Connected {
                connection_id: self.connection_id.clone(),
                message: "subscribed to metrics stream".to_string(),
            });
        }

        loop {
            tokio::select! {
                () = self.token.cancelled() => return None,
                _ = self.heartbeat.tick() => return Some(StreamEvent::Heartbeat { timestamp: unix_timestamp_secs() }),
                received = self.receiver.recv() => {
                    let Some(snapshot) = received else { return None };
                    if let Some(projected) = project(&snapshot, &self.filter) {
                        return Some(StreamEvent::Metrics(projected));
                    }
                    // Filter matched nothing this tick; wait for the next
                    // snapshot or heartbeat instead of emitting an empty event.
                }
            }
        }
    }
}

impl Drop for MetricsStream {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

/// Project a snapshot down to the requested names. An empty filter means
/// "everything"; a non-empty filter that matches nothing yields `None` so
/// the caller emits no event for this snapshot.
fn project(snapshot: &LatestSnapshot, filter: &[String]) -> Option<HashMap<String, MetricPoint>> {
    if filter.is_empty() {
        return Some((**snapshot).clone());
    }
    let projected: HashMap<String, MetricPoint> = filter
        .iter()
        .filter_map(|name| snapshot.get(name).map(|point| (name.clone(), *point)))
        .collect();
    (!projected.is_empty()).then_some(projected)
}

fn unix_timestamp_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
