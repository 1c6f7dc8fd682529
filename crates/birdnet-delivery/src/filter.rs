//! Shared comma-separated metric-name filter grammar used by both the
//! historical and streaming endpoints: whitespace around each name is
//! trimmed, empty names are dropped, and an absent/empty filter means
//! "everything".

/// Parse a `metrics=<csv>` query parameter into the list of names to keep.
/// `None` and `Some("")` both mean "no filter" and return an empty `Vec`;
/// callers treat an empty `Vec` as "deliver everything".
#[must_use]
pub fn parse_filter(raw: Option<&str>) -> Vec<String> {
    raw.map(|csv| {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
