use serde::Serialize;

/// Point-in-time view of one accumulator's window.
/// Serialized straight into the published JSON report.
///
/// With `sample_count == 0` every float field is NaN; sinks treat that as
/// "no data yet", not as an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticSnapshot {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub standard_deviation: f64,
    pub sample_count: i64,
}

impl StatisticSnapshot {
    /// All-NaN placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            average: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            standard_deviation: f64::NAN,
            sample_count: 0,
        }
    }

    /// Convenience: is this snapshot backed by at least one observation?
    pub fn has_data(&self) -> bool {
        self.sample_count > 0
    }
}

impl Default for StatisticSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_all_nan() {
        let s = StatisticSnapshot::empty();
        assert!(s.average.is_nan());
        assert!(s.min.is_nan());
        assert!(s.max.is_nan());
        assert!(s.standard_deviation.is_nan());
        assert_eq!(s.sample_count, 0);
        assert!(!s.has_data());
    }

    #[test]
    fn empty_serializes_nan_as_null() {
        let json = serde_json::to_value(StatisticSnapshot::empty()).unwrap();
        assert!(json["average"].is_null());
        assert_eq!(json["sample_count"], 0);
    }
}
