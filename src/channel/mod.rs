//! Channel timing collectors.
//!
//! A collector watches the events of one channel and turns their arrival
//! times into statistics through a pluggable [`TimingMetric`].

pub mod collector;
pub mod period;

pub use collector::{ChannelTimingCollector, TimingMetric};
pub use period::{PeriodCollector, PeriodMetric};
