//! Periodic multi-source metric collector.
//!
//! Samples CPU (via an injected function), memory, CPU temperature, disk
//! usage, disk I/O, and database latency/throughput on a fixed cadence,
//! then records one batch per tick into a [`birdnet_metrics_store::MetricsStore`].
//! Delta-based sources (disk I/O, database rates) own their previous-tick
//! state inside [`Collector`]; nothing here is shared across threads
//! except through that store.

#![forbid(unsafe_code)]

mod collector;
mod debounce;
mod disk;
mod rates;
mod thermal;

pub use collector::{Collector, CpuFn};
