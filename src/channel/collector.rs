use std::marker::PhantomData;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::clock::{ClockSource, Timestamp};
use crate::metrics::{StatisticSnapshot, StatisticsAccumulator};
use crate::sink::PublishSink;

/// Per-event metric: `(previous arrival, current arrival, payload) -> value`.
/// Return NaN to skip the event.
///
/// Runs under the collector's lock, so `stop()` can wait out an in-flight
/// event. It must be cheap and must not block: no I/O, no waiting on other
/// locks.
pub trait TimingMetric<T>: Send + Sync {
    fn compute(&self, previous: Timestamp, current: Timestamp, payload: &T) -> f64;
}

impl<T, F> TimingMetric<T> for F
where
    F: Fn(Timestamp, Timestamp, &T) -> f64 + Send + Sync,
{
    fn compute(&self, previous: Timestamp, current: Timestamp, payload: &T) -> f64 {
        self(previous, current, payload)
    }
}

/// Derives timing statistics from the events arriving on one channel.
///
/// The first event after `start()` only sets the baseline; every later one
/// feeds `metric(previous, now, payload)` into the accumulator. Events
/// delivered while stopped are dropped.
pub struct ChannelTimingCollector<T, M, C> {
    name: String,
    clock: C,
    metric: M,
    // Held for the whole of `on_event` so `stop()` waits out any
    // in-flight event.
    state: Mutex<State>,
    accumulator: StatisticsAccumulator,
    _payload: PhantomData<fn(&T)>,
}

#[derive(Debug, Default)]
struct State {
    started: bool,
    previous: Option<Timestamp>,
}

impl<T, M, C> ChannelTimingCollector<T, M, C>
where
    M: TimingMetric<T>,
    C: ClockSource,
{
    pub fn new(name: impl Into<String>, clock: C, metric: M) -> Self {
        Self {
            name: name.into(),
            clock,
            metric,
            state: Mutex::new(State::default()),
            accumulator: StatisticsAccumulator::new(),
            _payload: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Begin processing events. Returns `false` if already started.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if state.started {
            debug!(name = %self.name, "collector already started");
            return false;
        }
        state.started = true;
        info!(name = %self.name, "collector started");
        true
    }

    /// Stop processing events and forget the arrival baseline.
    /// Returns `false` if not started.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        if !state.started {
            debug!(name = %self.name, "collector already stopped");
            return false;
        }
        state.started = false;
        state.previous = None;
        info!(name = %self.name, "collector stopped");
        true
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Record one event arrival. Holds the state lock for the clock read,
    /// the metric and the accumulator update, all O(1).
    pub fn on_event(&self, payload: &T) {
        let mut state = self.state.lock();
        if !state.started {
            return;
        }

        let now = self.clock.now();
        if let Some(previous) = state.previous.replace(now) {
            self.accumulator
                .add_measurement(self.metric.compute(previous, now, payload));
        }
    }

    pub fn statistics_results(&self) -> StatisticSnapshot {
        self.accumulator.snapshot()
    }

    /// Drop the current window; the arrival baseline is kept.
    pub fn reset(&self) {
        self.accumulator.reset();
    }

    /// Hand the current window to `sink` under this collector's name and
    /// start a new one.
    pub fn publish_and_reset(&self, sink: &dyn PublishSink) -> StatisticSnapshot {
        let snapshot = self.accumulator.take_snapshot();
        sink.publish(&self.name, &snapshot);
        snapshot
    }
}
