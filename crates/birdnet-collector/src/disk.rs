//! Disk usage and I/O sampling.
//!
//! Two independent concerns live here: per-partition used-percent (a plain
//! point-in-time read) and per-device read/write throughput (a delta
//! between this tick's cumulative byte counters and the previous tick's,
//! divided by elapsed wall time). The delta state belongs to the caller —
//! see `collector.rs`'s `PrevDiskIo` — this module only computes the rate
//! given two snapshots.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use sysinfo::Disks;

/// Filesystem types that are virtual/pseudo and never worth a used-percent
/// sample.
const PSEUDO_FILESYSTEMS: &[&str] = &[
    "sysfs",
    "proc",
    "procfs",
    "devfs",
    "devtmpfs",
    "debugfs",
    "securityfs",
    "tmpfs",
    "ramfs",
    "overlay",
    "overlayfs",
    "fusectl",
    "devpts",
    "hugetlbfs",
    "mqueue",
    "cgroup",
    "cgroupfs",
    "pstore",
    "binfmt_misc",
    "bpf",
    "tracefs",
    "configfs",
    "autofs",
    "efivarfs",
];

#[must_use]
pub(crate) fn is_pseudo_filesystem(fs_type: &str) -> bool {
    PSEUDO_FILESYSTEMS.contains(&fs_type.to_ascii_lowercase().as_str())
}

/// Transform a mountpoint into the suffix used for its
/// `disk.used_percent.<sanitized>` metric name: `/` maps to `root`;
/// otherwise the leading slash is stripped and `\`, `/`, `:` become `-`,
/// with trailing dashes trimmed.
///
/// Idempotent: re-sanitizing an already-sanitized string is a no-op,
/// because the output never starts with `/` and never contains the
/// replaced separator characters or a trailing dash.
#[must_use]
pub(crate) fn sanitize_mountpoint(mount: &str) -> String {
    if mount == "/" {
        return "root".to_string();
    }
    let stripped = mount.strip_prefix('/').unwrap_or(mount);
    let mut out: String = stripped
        .chars()
        .map(|c| if matches!(c, '\\' | '/' | ':') { '-' } else { c })
        .collect();
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Used-percent for every partition whose filesystem isn't on the
/// pseudo-filesystem deny-list, keyed by sanitized mountpoint suffix.
#[must_use]
pub(crate) fn sample_usage(disks: &Disks) -> Vec<(String, f64)> {
    disks
        .list()
        .iter()
        .filter(|disk| !is_pseudo_filesystem(&disk.file_system().to_string_lossy()))
        .filter_map(|disk| {
            let total = disk.total_space();
            if total == 0 {
                return None;
            }
            #[allow(clippy::cast_precision_loss)]
            let used_percent =
                total.saturating_sub(disk.available_space()) as f64 / total as f64 * 100.0;
            let name = sanitize_mountpoint(&disk.mount_point().to_string_lossy());
            Some((name, used_percent))
        })
        .collect()
}

/// Cumulative read/write byte counters for every disk device, keyed by the
/// device's basename (e.g. `sda`, `nvme0n1`).
#[must_use]
pub(crate) fn sample_cumulative_io(disks: &Disks) -> HashMap<String, (u64, u64)> {
    disks
        .list()
        .iter()
        .map(|disk| {
            let name = Path::new(disk.name())
                .file_name()
                .map_or_else(|| disk.name().to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned());
            let usage = disk.usage();
            (name, (usage.total_read_bytes, usage.total_written_bytes))
        })
        .collect()
}

/// One device's read/write rate in bytes/sec, computed from two cumulative
/// samples. `None` when the counter went backwards (device swap, rollover,
/// reconnect) — callers must treat that as "no rate this tick", never a
/// negative rate.
#[must_use]
pub(crate) fn rate_bytes_per_sec(previous: u64, current: u64, elapsed: Duration) -> Option<f64> {
    if elapsed.is_zero() || current < previous {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    Some((current - previous) as f64 / elapsed.as_secs_f64())
}
