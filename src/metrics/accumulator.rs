use parking_lot::Mutex;

use super::snapshot::StatisticSnapshot;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe running statistics for one sampling window.
///
/// The timer task / event path calls `add_measurement()`, readers call
/// `snapshot()`, the publisher calls `reset()` at window rollover.
/// The lock is held only for the O(1) update, never across I/O.
pub struct StatisticsAccumulator {
    inner: Mutex<Moments>,
}

// ─── Internal state ──────────────────────────────────────────────

/// Welford state: count, running mean, sum of squared deviations (M2).
#[derive(Debug, Clone, Copy)]
struct Moments {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

// ─── StatisticsAccumulator impl ──────────────────────────────────

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Moments::new()),
        }
    }

    /// Fold one value into the window. NaN is the "no data" sentinel and
    /// is dropped without touching any state.
    pub fn add_measurement(&self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.inner.lock().add(value);
    }

    /// Produce a read-only snapshot; does not mutate the window.
    pub fn snapshot(&self) -> StatisticSnapshot {
        let moments = *self.inner.lock();
        moments.snapshot()
    }

    /// Take a snapshot and clear the window under a single lock, so no
    /// sample can land between the read and the reset.
    pub fn take_snapshot(&self) -> StatisticSnapshot {
        let mut guard = self.inner.lock();
        let snapshot = guard.snapshot();
        *guard = Moments::new();
        snapshot
    }

    /// Wipe all data back to the empty window.
    pub fn reset(&self) {
        *self.inner.lock() = Moments::new();
    }
}

impl Default for StatisticsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatisticsAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsAccumulator")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

// ─── Moments impl ────────────────────────────────────────────────

impl Moments {
    fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;

        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }

        // Welford: single pass, no sum-of-squares cancellation
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    fn snapshot(&self) -> StatisticSnapshot {
        if self.count == 0 {
            return StatisticSnapshot::empty();
        }

        // Population variance; a single sample has zero spread.
        let standard_deviation = if self.count == 1 {
            0.0
        } else {
            (self.m2 / self.count as f64).max(0.0).sqrt()
        };

        StatisticSnapshot {
            average: self.mean,
            min: self.min,
            max: self.max,
            standard_deviation,
            sample_count: self.count as i64,
        }
    }
}
