//! Measurement sources: anything that produces one numeric sample per tick.
//!
//! A source never fails loudly. Missing files, partial reads and garbage
//! all collapse to [`NO_DATA`], which the scheduler skips.

pub mod cpu;
pub mod memory;

use std::path::Path;

use tracing::debug;

pub use cpu::CpuMeasurement;
pub use memory::{process_meminfo_lines, MemoryMeasurement};

/// Sentinel meaning "no valid sample this tick".
pub const NO_DATA: f64 = f64::NAN;

/// Produces one sample per call, or [`NO_DATA`].
pub trait MeasurementSource: Send {
    fn measure(&mut self) -> f64;
}

impl<F> MeasurementSource for F
where
    F: FnMut() -> f64 + Send,
{
    fn measure(&mut self) -> f64 {
        self()
    }
}

/// Read a whole text file, or return an empty string if it can't be read.
pub fn read_file_to_string(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "measurement file unreadable");
            String::new()
        }
    }
}
