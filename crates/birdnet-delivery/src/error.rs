use thiserror::Error;

/// Result type alias for `birdnet-delivery` operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Errors the delivery adapter surfaces to its caller. These map to
/// client-facing errors (e.g. HTTP 400) at the framing layer that wraps
/// this crate; nothing here is a transient/source failure — those are
/// absorbed rather than returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("points must be a positive integer, got {0}")]
    InvalidPoints(i64),
}
