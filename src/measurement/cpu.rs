//! Global CPU utilization via `sysinfo`.
//!
//! Usage is derived from two refreshes, so the first call only primes the
//! counters and reports [`NO_DATA`].

use sysinfo::System;

use super::{MeasurementSource, NO_DATA};

/// CPU utilization source, percent busy across all cores.
pub struct CpuMeasurement {
    system: System,
    primed: bool,
}

impl CpuMeasurement {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            primed: false,
        }
    }
}

impl Default for CpuMeasurement {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpuMeasurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuMeasurement")
            .field("primed", &self.primed)
            .finish()
    }
}

impl MeasurementSource for CpuMeasurement {
    fn measure(&mut self) -> f64 {
        self.system.refresh_cpu();

        let has_cpus = !self.system.cpus().is_empty();
        if !std::mem::replace(&mut self.primed, has_cpus) {
            return NO_DATA;
        }
        usage_percentage(has_cpus, self.system.global_cpu_info().cpu_usage())
    }
}

/// `usage` as a sample, or [`NO_DATA`] when nothing usable was read.
fn usage_percentage(has_cpus: bool, usage: f32) -> f64 {
    if !has_cpus || !usage.is_finite() {
        return NO_DATA;
    }
    f64::from(usage).clamp(0.0, 100.0)
}
