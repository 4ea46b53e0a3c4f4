//! Inter-arrival period, in milliseconds.

use crate::clock::{ClockSource, MonotonicClock, Timestamp};

use super::collector::{ChannelTimingCollector, TimingMetric};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// `current - previous` in milliseconds; the payload is never inspected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodMetric;

impl<T> TimingMetric<T> for PeriodMetric {
    fn compute(&self, previous: Timestamp, current: Timestamp, _payload: &T) -> f64 {
        (current - previous).as_nanos() as f64 / NANOS_PER_MILLI
    }
}

/// Collector of message inter-arrival periods on one channel.
pub type PeriodCollector<T, C = MonotonicClock> = ChannelTimingCollector<T, PeriodMetric, C>;

impl<T, C: ClockSource> ChannelTimingCollector<T, PeriodMetric, C> {
    pub fn with_clock(name: impl Into<String>, clock: C) -> Self {
        Self::new(name, clock, PeriodMetric)
    }
}

impl<T> ChannelTimingCollector<T, PeriodMetric, MonotonicClock> {
    pub fn monotonic(name: impl Into<String>) -> Self {
        Self::new(name, MonotonicClock::new(), PeriodMetric)
    }
}
