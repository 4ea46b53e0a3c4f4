//! Publish sinks: where finished windows go.
//!
//! The core only promises to call [`PublishSink::publish`] at most once per
//! elapsed window. Delivery is the sink's problem.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use crate::metrics::StatisticSnapshot;

/// Receives `(name, snapshot)` pairs from schedulers and collectors.
pub trait PublishSink: Send + Sync {
    fn publish(&self, name: &str, snapshot: &StatisticSnapshot);
}

impl<F> PublishSink for F
where
    F: Fn(&str, &StatisticSnapshot) + Send + Sync,
{
    fn publish(&self, name: &str, snapshot: &StatisticSnapshot) {
        self(name, snapshot)
    }
}

/// One published window, as shipped downstream.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedReport {
    pub name: String,
    pub published_at: DateTime<Utc>,
    pub statistics: StatisticSnapshot,
}

impl PublishedReport {
    pub fn new(name: &str, statistics: StatisticSnapshot) -> Self {
        Self {
            name: name.to_owned(),
            published_at: Utc::now(),
            statistics,
        }
    }
}

// ─── LogSink ─────────────────────────────────────────────────────

/// Writes every report as one JSON line through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl PublishSink for LogSink {
    fn publish(&self, name: &str, snapshot: &StatisticSnapshot) {
        let report = PublishedReport::new(name, *snapshot);
        let json = serde_json::to_string(&report).unwrap_or_default();
        info!(
            target: "sysmetrics::publish",
            name,
            samples = snapshot.sample_count,
            report = %json,
            "statistics published"
        );
    }
}

// ─── ChannelSink ─────────────────────────────────────────────────

/// Forwards reports over a bounded channel.
///
/// Uses `try_send`: a full or closed channel drops the report rather than
/// stalling the sampling loop.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<PublishedReport>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PublishedReport>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl PublishSink for ChannelSink {
    fn publish(&self, name: &str, snapshot: &StatisticSnapshot) {
        match self.tx.try_send(PublishedReport::new(name, *snapshot)) {
            Ok(()) => {}
            Err(TrySendError::Full(report)) => {
                warn!(name = %report.name, "publish channel full, report dropped");
            }
            Err(TrySendError::Closed(report)) => {
                warn!(name = %report.name, "publish channel closed, report dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn sample() -> StatisticSnapshot {
        StatisticSnapshot {
            average: 2.0,
            min: 1.0,
            max: 3.0,
            standard_deviation: 0.5,
            sample_count: 4,
        }
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let sink = move |name: &str, s: &StatisticSnapshot| {
            seen2.lock().push((name.to_owned(), s.sample_count));
        };

        sink.publish("mem", &sample());
        assert_eq!(*seen.lock(), vec![("mem".to_owned(), 4)]);
    }

    #[test]
    fn channel_sink_delivers_reports() {
        let (sink, mut rx) = ChannelSink::new(4);
        sink.publish("cpu", &sample());

        let report = rx.try_recv().unwrap();
        assert_eq!(report.name, "cpu");
        assert_eq!(report.statistics, sample());
    }

    #[test]
    fn channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::new(1);
        sink.publish("a", &sample());
        sink.publish("b", &sample());

        assert_eq!(rx.try_recv().unwrap().name, "a");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_survives_closed_receiver() {
        let (sink, rx) = ChannelSink::new(1);
        drop(rx);
        sink.publish("a", &sample());
    }

    #[test]
    fn report_serializes_with_name_and_stats() {
        let json = serde_json::to_value(PublishedReport::new("mem", sample())).unwrap();
        assert_eq!(json["name"], "mem");
        assert_eq!(json["statistics"]["sample_count"], 4);
        assert!(json["published_at"].is_string());
    }
}
