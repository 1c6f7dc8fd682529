use crate::point::MetricPoint;

/// Fixed-capacity circular buffer of the most recent samples for one metric.
///
/// `RingBuffer` is plain data with no internal locking: callers (the
/// `MetricsStore`) are expected to guard access with their own lock, so
/// there is no per-series lock here — see the concurrency notes in the
/// store crate. Capacity is fixed at construction and never changes;
/// writes never allocate, reads allocate exactly the slice they return.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buf: Vec<MetricPoint>,
    capacity: usize,
    head: usize,
    count: usize,
}

impl RingBuffer {
    /// Create a buffer holding at most `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero — a zero-capacity series can never hold
    /// a sample, which is always a caller bug rather than a runtime
    /// condition worth propagating as an error.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be positive");
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            count: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Store `point` at `head`, overwriting the oldest sample once full.
    pub fn write(&mut self, point: MetricPoint) {
        if self.buf.len() < self.capacity {
            self.buf.push(point);
        } else {
            self.buf[self.head] = point;
        }
        self.head = (self.head + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Return up to the last `n` samples, oldest first. `n == 0` or
    /// `n > count` means "all available"; an empty buffer returns an empty
    /// vec, never an error.
    #[must_use]
    pub fn read(&self, n: usize) -> Vec<MetricPoint> {
        if self.count == 0 {
            return Vec::new();
        }
        let want = if n == 0 || n > self.count { self.count } else { n };
        let oldest = (self.head + self.capacity - self.count) % self.capacity;
        let start = (oldest + (self.count - want)) % self.capacity;

        let mut out = Vec::with_capacity(want);
        for i in 0..want {
            out.push(self.buf[(start + i) % self.capacity]);
        }
        out
    }

    /// The newest sample, if any.
    #[must_use]
    pub fn latest(&self) -> Option<MetricPoint> {
        if self.count == 0 {
            return None;
        }
        let idx = (self.head + self.capacity - 1) % self.capacity;
        Some(self.buf[idx])
    }
}
