//! In-process telemetry agent.
//!
//! Samples resource usage on a timer ([`scheduler`]), times message arrivals
//! on named channels ([`channel`]), folds both into running window statistics
//! ([`metrics`]) and hands finished windows to a [`sink::PublishSink`].

pub mod channel;
pub mod clock;
pub mod config;
pub mod measurement;
pub mod metrics;
pub mod scheduler;
pub mod sink;

pub use channel::{ChannelTimingCollector, PeriodCollector, TimingMetric};
pub use clock::{ClockSource, FakeClock, MonotonicClock, Timestamp};
pub use measurement::{MeasurementSource, NO_DATA};
pub use metrics::{StatisticSnapshot, StatisticsAccumulator};
pub use scheduler::{PeriodicMeasurementScheduler, SchedulerOptions};
pub use sink::PublishSink;
