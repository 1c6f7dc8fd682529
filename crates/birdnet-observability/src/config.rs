//! Environment-driven configuration for [`crate::Observability`].

use std::env;
use std::time::Duration;

/// Resolved, validated knobs for wiring the Collector, store, and delivery
/// adapter together. All fields have documented defaults; construction
/// panics on a non-positive interval or ring capacity rather than limping
/// along with a misconfigured cadence.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub interval: Duration,
    pub ring_capacity: usize,
    pub slow_query_micros: u64,
    pub history_points: usize,
    pub heartbeat: Duration,
}

impl Config {
    /// Load from `BIRDNET_METRICS_*` environment variables, falling back
    /// to documented defaults for anything unset or unparsable.
    ///
    /// # Panics
    ///
    /// Panics if the resolved interval or ring capacity is non-positive.
    #[must_use]
    pub fn from_env() -> Self {
        let interval_secs = env_u64("BIRDNET_METRICS_INTERVAL_SECS", 5);
        assert!(interval_secs > 0, "BIRDNET_METRICS_INTERVAL_SECS must be positive");

        let default_capacity = (3600 / interval_secs).max(16);
        let ring_capacity = env_usize(
            "BIRDNET_METRICS_RING_CAPACITY",
            usize::try_from(default_capacity).unwrap_or(16),
        );
        assert!(ring_capacity > 0, "BIRDNET_METRICS_RING_CAPACITY must be positive");

        Self {
            interval: Duration::from_secs(interval_secs),
            ring_capacity,
            slow_query_micros: env_u64("BIRDNET_METRICS_SLOW_QUERY_MICROS", 100_000),
            history_points: env_usize("BIRDNET_METRICS_HISTORY_POINTS", birdnet_delivery::DEFAULT_HISTORY_POINTS),
            heartbeat: Duration::from_secs(env_u64("BIRDNET_METRICS_HEARTBEAT_SECS", 30)),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    #[cfg(test)]
    if let Some(v) = tests::test_env_override_value(key) {
        return Some(v);
    }
    env::var(key).ok()
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_value(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_value(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    thread_local! {
        static TEST_ENV_OVERRIDES: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
    }

    pub(super) fn test_env_override_value(key: &str) -> Option<String> {
        TEST_ENV_OVERRIDES.with(|cell| cell.borrow().get(key).cloned())
    }

    struct EnvGuard {
        keys: Vec<&'static str>,
    }

    impl EnvGuard {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            TEST_ENV_OVERRIDES.with(|cell| {
                let mut map = cell.borrow_mut();
                for (key, value) in vars {
                    map.insert((*key).to_string(), (*value).to_string());
                }
            });
            Self { keys: vars.iter().map(|(k, _)| *k).collect() }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            TEST_ENV_OVERRIDES.with(|cell| {
                let mut map = cell.borrow_mut();
                for key in &self.keys {
                    map.remove(*key);
                }
            });
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::from_env();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.ring_capacity, 720); // 3600 / 5
        assert_eq!(config.slow_query_micros, 100_000);
        assert_eq!(config.history_points, 360);
        assert_eq!(config.heartbeat, Duration::from_secs(30));
    }

    #[test]
    fn ring_capacity_default_has_a_floor_of_sixteen() {
        let _env = EnvGuard::set(&[("BIRDNET_METRICS_INTERVAL_SECS", "3600")]);
        let config = Config::from_env();
        assert_eq!(config.ring_capacity, 16);
    }

    #[test]
    fn explicit_overrides_are_honored() {
        let _env = EnvGuard::set(&[
            ("BIRDNET_METRICS_INTERVAL_SECS", "10"),
            ("BIRDNET_METRICS_RING_CAPACITY", "42"),
            ("BIRDNET_METRICS_SLOW_QUERY_MICROS", "5000"),
            ("BIRDNET_METRICS_HISTORY_POINTS", "99"),
            ("BIRDNET_METRICS_HEARTBEAT_SECS", "15"),
        ]);
        let config = Config::from_env();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.ring_capacity, 42);
        assert_eq!(config.slow_query_micros, 5000);
        assert_eq!(config.history_points, 99);
        assert_eq!(config.heartbeat, Duration::from_secs(15));
    }

    #[test]
    #[should_panic(expected = "INTERVAL_SECS must be positive")]
    fn zero_interval_panics() {
        let _env = EnvGuard::set(&[("BIRDNET_METRICS_INTERVAL_SECS", "0")]);
        let _ = Config::from_env();
    }
}
