//! Injectable time sources.
//!
//! Collectors never read the system clock directly; they ask a
//! [`ClockSource`] for a [`Timestamp`]. Production code uses
//! [`MonotonicClock`], tests drive a [`FakeClock`] by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Opaque instant, nanoseconds since the owning clock's epoch.
///
/// Only instants from the same clock are comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Duration from `earlier` to `self`, zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl std::ops::Sub for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(saturating_nanos(rhs)))
    }
}

/// Nanoseconds in `d`, pinned to `u64::MAX` instead of truncating.
fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Anything that can tell the current time.
pub trait ClockSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Steady clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp(saturating_nanos(self.anchor.elapsed()))
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Default)]
pub struct FakeClock {
    nanos: AtomicU64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::starting_at(Timestamp::default())
    }

    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            nanos: AtomicU64::new(start.as_nanos()),
        }
    }

    /// Move forward by `by`, stopping at the largest representable instant.
    pub fn advance(&self, by: Duration) {
        let by = saturating_nanos(by);
        // Closure always returns Some, so the update cannot fail.
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_add(by))
            });
    }

    pub fn set(&self, at: Timestamp) {
        self.nanos.store(at.as_nanos(), Ordering::SeqCst);
    }
}

impl ClockSource for FakeClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.nanos.load(Ordering::SeqCst))
    }
}

impl<C: ClockSource + ?Sized> ClockSource for std::sync::Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn fake_clock_advances_only_when_told() {
        let clock = FakeClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);

        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now() - t0, Duration::from_secs(1));
    }

    #[test]
    fn huge_advance_never_goes_backwards() {
        let clock = FakeClock::starting_at(Timestamp::from_nanos(1_000));
        clock.advance(Duration::from_secs(u64::MAX));
        assert_eq!(clock.now(), Timestamp::from_nanos(u64::MAX));

        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Timestamp::from_nanos(u64::MAX));
    }

    #[test]
    fn adding_huge_duration_saturates() {
        let t = Timestamp::from_nanos(5) + Duration::from_secs(u64::MAX);
        assert_eq!(t, Timestamp::from_nanos(u64::MAX));

        // exactly 2^64 ns, which truncates to zero as a u64
        let two_pow_64 = Duration::new(18_446_744_073, 709_551_616);
        assert_eq!(Timestamp::from_nanos(5) + two_pow_64, Timestamp::from_nanos(u64::MAX));
    }

    #[test]
    fn subtraction_saturates() {
        let early = Timestamp::from_nanos(10);
        let late = Timestamp::from_nanos(30);
        assert_eq!(late - early, Duration::from_nanos(20));
        assert_eq!(early - late, Duration::ZERO);
    }

    #[test]
    fn shared_fake_clock_is_visible_through_arc() {
        let clock = std::sync::Arc::new(FakeClock::new());
        let handle = clock.clone();
        clock.set(Timestamp::from_nanos(500));
        assert_eq!(handle.now(), Timestamp::from_nanos(500));
    }
}
