//! Log-once-per-category debouncer.
//!
//! A persistently unavailable platform source (no thermal sensors, no disk
//! counters) must not flood the log on every tick. Each category gets one
//! `AtomicBool` that latches the first time it fires; nothing un-latches it
//! for the life of the `Collector`, so a missing source is logged once and
//! otherwise skipped without ever failing the batch.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub(crate) struct Debouncer {
    memory: AtomicBool,
    disk_list: AtomicBool,
    disk_io: AtomicBool,
}

impl Debouncer {
    /// Run `log` exactly once for `category`, silently no-op on every
    /// subsequent call.
    pub(crate) fn once(&self, category: Category, log: impl FnOnce()) {
        let flag = match category {
            Category::Memory => &self.memory,
            Category::DiskList => &self.disk_list,
            Category::DiskIo => &self.disk_io,
        };
        if flag
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            log();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Category {
    Memory,
    DiskList,
    DiskIo,
}
