use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::measurement::{MeasurementSource, NO_DATA};
use crate::metrics::{StatisticSnapshot, StatisticsAccumulator};
use crate::sink::PublishSink;

// ─── Configuration ───────────────────────────────────────────────

/// Time between two measurements.
pub const DEFAULT_MEASUREMENT_INTERVAL: Duration = Duration::from_secs(1);

/// Measurement ticks aggregated into one published snapshot.
pub const DEFAULT_PUBLISH_WINDOW: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub measurement_interval: Duration,
    pub publish_window: u64,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            measurement_interval: DEFAULT_MEASUREMENT_INTERVAL,
            publish_window: DEFAULT_PUBLISH_WINDOW,
        }
    }
}

// ─── Public types ────────────────────────────────────────────────

/// Samples a [`MeasurementSource`] on a fixed interval and publishes a
/// statistics snapshot every `publish_window` ticks.
///
/// `start()` spawns one tokio task per session. Each measurement runs on
/// the blocking pool, so a source stuck in file I/O never stalls the
/// executor. `stop().await` aborts the session and waits out any
/// measurement already in flight, so nothing touches the source or the
/// statistics after `stop` returns. A partially filled window is never
/// published: it stays visible through `statistics_results()` until the
/// next `start()` opens a fresh window.
pub struct PeriodicMeasurementScheduler<S> {
    shared: Arc<Shared<S>>,
    session: Mutex<Option<JoinHandle<()>>>,
}

// ─── Internal state ──────────────────────────────────────────────

struct Shared<S> {
    name: String,
    options: SchedulerOptions,
    // Bumped on every start and stop; a measurement from an older
    // session finds a different value and is discarded.
    epoch: AtomicU64,
    // Async mutex so `stop` can wait for an in-flight read without
    // blocking the executor. Separate from the accumulator lock.
    source: tokio::sync::Mutex<S>,
    accumulator: StatisticsAccumulator,
    sink: Arc<dyn PublishSink>,
}

// ─── PeriodicMeasurementScheduler impl ───────────────────────────

impl<S> PeriodicMeasurementScheduler<S>
where
    S: MeasurementSource + 'static,
{
    pub fn new(
        name: impl Into<String>,
        source: S,
        options: SchedulerOptions,
        sink: Arc<dyn PublishSink>,
    ) -> Self {
        let options = SchedulerOptions {
            measurement_interval: options.measurement_interval.max(Duration::from_millis(1)),
            publish_window: options.publish_window.max(1),
        };
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                options,
                epoch: AtomicU64::new(0),
                source: tokio::sync::Mutex::new(source),
                accumulator: StatisticsAccumulator::new(),
                sink,
            }),
            session: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn options(&self) -> SchedulerOptions {
        self.shared.options
    }

    /// Engage the timer. Returns `false` if already started or if called
    /// outside a tokio runtime.
    pub fn start(&self) -> bool {
        let mut session = self.session.lock();
        if session.is_some() {
            debug!(name = %self.shared.name, "scheduler already started");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(name = %self.shared.name, error = %e, "cannot start scheduler without a tokio runtime");
                return false;
            }
        };

        // Fresh window per session
        self.shared.accumulator.reset();

        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        *session = Some(runtime.spawn(self.shared.clone().run(epoch)));

        info!(
            name = %self.shared.name,
            interval_ms = self.shared.options.measurement_interval.as_millis() as u64,
            publish_window = self.shared.options.publish_window,
            "scheduler started"
        );
        true
    }

    /// Cancel the timer and wait until the session task and any
    /// measurement it started are gone. Returns `false` if not started.
    pub async fn stop(&self) -> bool {
        let handle = self.session.lock().take();
        let Some(handle) = handle else {
            debug!(name = %self.shared.name, "scheduler already stopped");
            return false;
        };

        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        handle.abort();
        // JoinError is the expected outcome of abort()
        let _ = handle.await;

        // A blocking read cannot be aborted; wait for it to release the source.
        drop(self.shared.source.lock().await);

        info!(name = %self.shared.name, "scheduler stopped");
        true
    }

    pub fn is_started(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Current, unpublished window.
    pub fn statistics_results(&self) -> StatisticSnapshot {
        self.shared.accumulator.snapshot()
    }
}

impl<S> Drop for PeriodicMeasurementScheduler<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.session.get_mut().take() {
            self.shared.epoch.fetch_add(1, Ordering::SeqCst);
            handle.abort();
        }
    }
}

// ─── Session loop ────────────────────────────────────────────────

impl<S> Shared<S>
where
    S: MeasurementSource + 'static,
{
    async fn run(self: Arc<Self>, epoch: u64) {
        let period = self.options.measurement_interval;
        // First measurement one period after start, not immediately
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut ticks = IntervalStream::new(interval);
        let mut ticks_since_publish = 0u64;

        while ticks.next().await.is_some() {
            let shared = self.clone();
            let value = match tokio::task::spawn_blocking(move || shared.measure_for(epoch)).await {
                Ok(Some(value)) => value,
                // Session ended while the read was queued
                Ok(None) => break,
                Err(e) => {
                    warn!(name = %self.name, error = %e, "measurement task failed");
                    NO_DATA
                }
            };
            self.record(value, &mut ticks_since_publish);
        }
    }
}

impl<S> Shared<S>
where
    S: MeasurementSource,
{
    /// Runs on the blocking pool. `None` if `epoch` is no longer current.
    fn measure_for(&self, epoch: u64) -> Option<f64> {
        let mut source = self.source.blocking_lock();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return None;
        }
        Some(source.measure())
    }

    /// Fold one tick's value in; publishes and resets once the window is full.
    fn record(&self, value: f64, ticks_since_publish: &mut u64) {
        if value.is_nan() {
            debug!(name = %self.name, "no data this tick");
        }
        self.accumulator.add_measurement(value);

        *ticks_since_publish += 1;
        if *ticks_since_publish < self.options.publish_window {
            return;
        }
        *ticks_since_publish = 0;

        let snapshot = self.accumulator.take_snapshot();
        debug!(name = %self.name, samples = snapshot.sample_count, "publishing window");
        self.sink.publish(&self.name, &snapshot);
    }
}
