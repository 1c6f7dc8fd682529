//! Best-effort CPU temperature sampling via the Linux thermal-zone sysfs
//! interface.
//!
//! This is deliberately not routed through `sysinfo::Components`: reading
//! the exact sysfs layout directly (`/sys/class/thermal/thermal_zone*/
//! {type,temp}`) against a CPU-sensor tag allowlist gives control
//! `Components` doesn't expose. Platforms without that directory (anything
//! non-Linux, or a Linux box with no thermal zones) get a portable no-op:
//! absence is not an error.

use std::fs;
use std::path::{Path, PathBuf};

/// Tags (the contents of a thermal zone's `type` file) that identify a CPU
/// package sensor as opposed to GPU/battery/other zones.
const CPU_SENSOR_TAGS: &[&str] = &[
    "cpu-thermal",
    "x86_pkg_temp",
    "soc_thermal",
    "cpu_thermal",
    "thermal-fan-est",
];

/// Millidegree-Celsius readings must land in this open-below, closed-above
/// range to be trusted; sensors report nonsense both below and far above
/// plausible operating temperatures.
const MIN_CELSIUS: f64 = 0.0;
const MAX_CELSIUS: f64 = 120.0;

#[cfg(target_os = "linux")]
fn default_root() -> Option<PathBuf> {
    Some(PathBuf::from("/sys/class/thermal"))
}

#[cfg(not(target_os = "linux"))]
fn default_root() -> Option<PathBuf> {
    None
}

/// Sample CPU package temperature in °C, or `None` if no matching sensor is
/// present (or this platform has no thermal-zone interface at all).
#[must_use]
pub(crate) fn sample_cpu_temperature() -> Option<f64> {
    default_root().and_then(|root| sample_at(&root))
}

/// Same algorithm, rooted at an arbitrary directory so tests can stage
/// synthetic `thermal_zone*` entries without touching the real sysfs tree.
pub(crate) fn sample_at(root: &Path) -> Option<f64> {
    let mut zones = zone_dirs(root);
    zones.sort_by_key(|(index, _)| *index);

    for (_, zone) in zones {
        let Ok(kind) = fs::read_to_string(zone.join("type")) else {
            continue;
        };
        if !CPU_SENSOR_TAGS.contains(&kind.trim()) {
            continue;
        }
        let Ok(raw) = fs::read_to_string(zone.join("temp")) else {
            continue;
        };
        let Ok(millidegrees) = raw.trim().parse::<i64>() else {
            continue;
        };
        #[allow(clippy::cast_precision_loss)]
        let celsius = millidegrees as f64 / 1000.0;
        if celsius > MIN_CELSIUS && celsius <= MAX_CELSIUS {
            return Some(celsius);
        }
    }
    None
}

/// List `thermal_zone<N>` subdirectories paired with their numeric index,
/// so callers can sort zones the way sysfs orders them rather than by
/// lexical directory-entry order (`thermal_zone10` < `thermal_zone2`
/// lexically, but not numerically).
fn zone_dirs(root: &Path) -> Vec<(u32, PathBuf)> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            let index = name.strip_prefix("thermal_zone")?.parse::<u32>().ok()?;
            Some((index, entry.path()))
        })
        .collect()
}
