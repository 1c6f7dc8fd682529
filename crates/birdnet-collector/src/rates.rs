//! Pure delta-to-rate math for the per-tick database and disk-I/O metrics.
//! Kept free of any clock dependency — callers measure elapsed wall time
//! themselves — so the formulas are testable against exact, hand-picked
//! durations instead of real sleeps.

use birdnet_metrics_core::Snapshot;
use std::collections::HashMap;
use std::time::Duration;

/// Database latency/throughput metrics for one tick, given the freshly
/// taken `current` snapshot and, if this isn't the first tick, the
/// previous snapshot plus elapsed time since it was taken.
///
/// `db.read_latency_max_ms`/`db.write_latency_max_ms` are always present:
/// `Counters::snapshot` resets those fields on every call, so every tick
/// must consume whatever it collected, starting with the first.
#[must_use]
pub(crate) fn db_metrics(current: Snapshot, previous: Option<(Snapshot, Duration)>) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    out.insert(
        "db.read_latency_max_ms".to_string(),
        micros_to_millis(current.read_max_micros),
    );
    out.insert(
        "db.write_latency_max_ms".to_string(),
        micros_to_millis(current.write_max_micros),
    );

    let Some((previous, elapsed)) = previous else {
        return out;
    };
    if elapsed.is_zero() {
        return out;
    }

    let delta_reads = current.read_count.saturating_sub(previous.read_count);
    let delta_writes = current.write_count.saturating_sub(previous.write_count);

    if delta_reads > 0 {
        let delta_micros = current.read_total_micros.saturating_sub(previous.read_total_micros);
        #[allow(clippy::cast_precision_loss)]
        out.insert(
            "db.read_latency_ms".to_string(),
            micros_to_millis(delta_micros) / delta_reads as f64,
        );
    }
    if delta_writes > 0 {
        let delta_micros = current.write_total_micros.saturating_sub(previous.write_total_micros);
        #[allow(clippy::cast_precision_loss)]
        out.insert(
            "db.write_latency_ms".to_string(),
            micros_to_millis(delta_micros) / delta_writes as f64,
        );
    }

    #[allow(clippy::cast_precision_loss)]
    let total_queries = (delta_reads + delta_writes) as f64;
    out.insert("db.queries_per_sec".to_string(), total_queries / elapsed.as_secs_f64());
    out
}

#[allow(clippy::cast_precision_loss)]
fn micros_to_millis(micros: u64) -> f64 {
    micros as f64 / 1000.0
}

/// Per-device `disk.io.read.<name>` / `disk.io.write.<name>` rates, given
/// this tick's cumulative byte counters and the previous tick's (if any).
/// A device absent from `previous` (newly appeared) contributes nothing
/// this tick — there is no baseline to diff against yet.
#[must_use]
pub(crate) fn disk_io_metrics(
    current: &HashMap<String, (u64, u64)>,
    previous: Option<(&HashMap<String, (u64, u64)>, Duration)>,
) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    let Some((previous, elapsed)) = previous else {
        return out;
    };

    for (device, (read, write)) in current {
        let Some((prev_read, prev_write)) = previous.get(device) else {
            continue;
        };
        if let Some(rate) = crate::disk::rate_bytes_per_sec(*prev_read, *read, elapsed) {
            out.insert(format!("disk.io.read.{device}"), rate);
        }
        if let Some(rate) = crate::disk::rate_bytes_per_sec(*prev_write, *write, elapsed) {
            out.insert(format!("disk.io.write.{device}"), rate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(read_count: u64, read_total_micros: u64, write_count: u64, write_total_micros: u64) -> Snapshot {
        Snapshot {
            collected_at_millis: 0,
            read_count,
            read_total_micros,
            read_max_micros: 0,
            write_count,
            write_total_micros,
            write_max_micros: 0,
            slow_queries: 0,
            busy_timeouts: 0,
        }
    }

    #[test]
    fn first_tick_emits_only_max_latency() {
        let mut current = snapshot(0, 0, 0, 0);
        current.read_max_micros = 12_000;
        current.write_max_micros = 8_000;

        let out = db_metrics(current, None);
        assert_eq!(out.get("db.read_latency_max_ms"), Some(&12.0));
        assert_eq!(out.get("db.write_latency_max_ms"), Some(&8.0));
        assert!(!out.contains_key("db.queries_per_sec"));
        assert!(!out.contains_key("db.read_latency_ms"));
        assert!(!out.contains_key("db.write_latency_ms"));
    }

    #[test]
    fn query_rate_over_a_five_second_window() {
        let previous = snapshot(0, 0, 0, 0);
        let current = snapshot(50, 250_000, 10, 100_000);

        let out = db_metrics(current, Some((previous, Duration::from_secs(5))));
        assert_eq!(out.get("db.queries_per_sec"), Some(&12.0));
        assert_eq!(out.get("db.read_latency_ms"), Some(&5.0));
        assert_eq!(out.get("db.write_latency_ms"), Some(&10.0));
    }

    #[test]
    fn no_reads_or_writes_this_window_omits_their_latency_entries() {
        let previous = snapshot(10, 1_000, 2, 200);
        let current = previous; // nothing happened between ticks

        let out = db_metrics(current, Some((previous, Duration::from_secs(5))));
        assert!(!out.contains_key("db.read_latency_ms"));
        assert!(!out.contains_key("db.write_latency_ms"));
        assert_eq!(out.get("db.queries_per_sec"), Some(&0.0));
    }

    #[test]
    fn disk_io_first_tick_is_empty() {
        let current = HashMap::from([("sda".to_string(), (100u64, 50u64))]);
        assert!(disk_io_metrics(&current, None).is_empty());
    }

    #[test]
    fn disk_io_rate_over_interval() {
        let previous = HashMap::from([("sda".to_string(), (1_000u64, 500u64))]);
        let current = HashMap::from([("sda".to_string(), (6_000u64, 3_000u64))]);

        let out = disk_io_metrics(&current, Some((&previous, Duration::from_secs(5))));
        assert_eq!(out.get("disk.io.read.sda"), Some(&1_000.0));
        assert_eq!(out.get("disk.io.write.sda"), Some(&500.0));
    }

    #[test]
    fn disk_io_counter_reset_emits_nothing_for_that_device() {
        let previous = HashMap::from([("sda".to_string(), (5_000u64, 5_000u64))]);
        let current = HashMap::from([("sda".to_string(), (100u64, 100u64))]);

        let out = disk_io_metrics(&current, Some((&previous, Duration::from_secs(5))));
        assert!(out.is_empty());
    }

    #[test]
    fn disk_io_new_device_has_no_baseline_yet() {
        let previous = HashMap::from([("sda".to_string(), (1_000u64, 500u64))]);
        let current = HashMap::from([
            ("sda".to_string(), (2_000u64, 1_000u64)),
            ("nvme0n1".to_string(), (10u64, 10u64)),
        ]);

        let out = disk_io_metrics(&current, Some((&previous, Duration::from_secs(5))));
        assert!(!out.contains_key("disk.io.read.nvme0n1"));
        assert!(out.contains_key("disk.io.read.sda"));
    }
}
