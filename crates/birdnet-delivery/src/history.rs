//! Historical query resolution for the `GET /system/metrics/history`
//! endpoint contract. The HTTP framing itself is out of scope; this
//! module is what a handler would call to turn `metrics=`/`points=`
//! query parameters into the response body.

use crate::error::{DeliveryError, Result};
use crate::filter::parse_filter;
use birdnet_metrics_core::MetricPoint;
use birdnet_metrics_store::MetricsStore;
use std::collections::HashMap;

/// Default `points` value when the caller doesn't specify one.
pub const DEFAULT_HISTORY_POINTS: usize = 360;

/// Resolve a historical-metrics query against `store`.
///
/// `metrics_csv` follows the comma-separated filter grammar in
/// [`parse_filter`]; an empty filter returns every known series. `points`
/// defaults to [`DEFAULT_HISTORY_POINTS`] and must be positive — a
/// non-positive value is a client error, not silently clamped.
pub fn history(
    store: &MetricsStore,
    metrics_csv: Option<&str>,
    points: Option<i64>,
) -> Result<HashMap<String, Vec<MetricPoint>>> {
    let n = match points {
        None => DEFAULT_HISTORY_POINTS,
        Some(p) if p > 0 => usize::try_from(p).unwrap_or(usize::MAX),
        Some(p) => return Err(DeliveryError::InvalidPoints(p)),
    };

    let names = parse_filter(metrics_csv);
    if names.is_empty() {
        return Ok(store.get_all(n));
    }

    Ok(names
        .into_iter()
        .filter_map(|name| {
            let series = store.get(&name, n);
            (!series.is_empty()).then_some((name, series))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> MetricsStore {
        let store = MetricsStore::new(16);
        store.record_batch(&HashMap::from([
            ("cpu.total".to_string(), 10.0),
            ("memory.used_percent".to_string(), 55.0),
        ]));
        store
    }

    #[test]
    fn filtered_query_keeps_only_known_requested_names() {
        let store = seeded_store();
        let result = history(&store, Some("cpu.total,unknown"), Some(10)).unwrap();
        assert!(result.contains_key("cpu.total"));
        assert!(!result.contains_key("unknown"));
        assert!(!result.contains_key("memory.used_percent"));
    }

    #[test]
    fn no_filter_returns_every_known_series() {
        let store = seeded_store();
        let result = history(&store, None, None).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn non_positive_points_is_a_client_error() {
        let store = seeded_store();
        assert_eq!(history(&store, None, Some(0)), Err(DeliveryError::InvalidPoints(0)));
        assert_eq!(history(&store, None, Some(-5)), Err(DeliveryError::InvalidPoints(-5)));
    }

    #[test]
    fn default_points_is_360_when_unspecified() {
        let store = MetricsStore::new(500);
        for i in 0..400 {
            store.record_batch(&HashMap::from([("cpu.total".to_string(), i as f64)]));
        }
        let result = history(&store, Some("cpu.total"), None).unwrap();
        assert_eq!(result["cpu.total"].len(), DEFAULT_HISTORY_POINTS);
    }
}
