//! `/proc/meminfo` reader.
//!
//! Used memory is `MemTotal - MemAvailable`, reported as a percentage of
//! `MemTotal`. Line order does not matter and unknown keys are ignored.

use std::path::PathBuf;

use super::{read_file_to_string, MeasurementSource, NO_DATA};

/// Default location of the kernel memory report.
pub const MEMINFO_PATH: &str = "/proc/meminfo";

const MEM_TOTAL: &str = "MemTotal";
const MEM_AVAILABLE: &str = "MemAvailable";

/// Memory utilization source bound to a meminfo file.
#[derive(Debug, Clone)]
pub struct MemoryMeasurement {
    path: PathBuf,
}

impl MemoryMeasurement {
    pub fn new() -> Self {
        Self::with_path(MEMINFO_PATH)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for MemoryMeasurement {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSource for MemoryMeasurement {
    fn measure(&mut self) -> f64 {
        process_meminfo_lines(&read_file_to_string(&self.path))
    }
}

/// Percent of memory in use, or [`NO_DATA`] if either field is missing
/// or unparseable.
pub fn process_meminfo_lines(text: &str) -> f64 {
    let mut total: Option<u64> = None;
    let mut available: Option<u64> = None;

    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let slot = match key.trim() {
            MEM_TOTAL => &mut total,
            MEM_AVAILABLE => &mut available,
            _ => continue,
        };
        // "   16302048 kB" → 16302048
        *slot = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse().ok());

        if total.is_some() && available.is_some() {
            break;
        }
    }

    match (total, available) {
        (Some(total), Some(available)) if total > 0 && available <= total => {
            100.0 * (total - available) as f64 / total as f64
        }
        _ => NO_DATA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SAMPLE: &str = "";
    const GARBAGE_SAMPLE: &str = "this is garbage\n";
    const INCOMPLETE_SAMPLE: &str = "MemTotal:       16302048 kB\n\
                                     MemFree:          443300 kB\n";
    const COMPLETE_SAMPLE: &str = "MemTotal:       16302048 kB\n\
                                   MemFree:          239124 kB\n\
                                   MemAvailable:    9104952 kB\n";
    const REORDERED_SAMPLE: &str = "MemAvailable:    9104952 kB\n\
                                    Buffers:         2755028 kB\n\
                                    MemTotal:       16302048 kB\n";
    const FULL_SAMPLE: &str = "MemTotal:       16302048 kB\n\
MemFree:          239124 kB\n\
MemAvailable:    9104952 kB\n\
Buffers:         2755028 kB\n\
Cached:          5351344 kB\n\
SwapCached:       202440 kB\n\
Active:          9743384 kB\n\
Inactive:        3662540 kB\n\
Active(anon):    5246708 kB\n\
Inactive(anon):  1084404 kB\n\
Active(file):    4496676 kB\n\
Inactive(file):  2578136 kB\n\
Unevictable:          68 kB\n\
Mlocked:              68 kB\n\
SwapTotal:       8003580 kB\n\
SwapFree:        6510332 kB\n\
Dirty:               436 kB\n\
Writeback:             0 kB\n\
AnonPages:       5294808 kB\n\
Mapped:           823420 kB\n\
Shmem:           1037804 kB\n\
Slab:            2371932 kB\n\
SReclaimable:    2118248 kB\n\
SUnreclaim:       253684 kB\n\
KernelStack:       21968 kB\n\
PageTables:       114360 kB\n\
NFS_Unstable:          0 kB\n\
Bounce:                0 kB\n\
WritebackTmp:          0 kB\n\
CommitLimit:    16154604 kB\n\
Committed_AS:   19520052 kB\n\
VmallocTotal:   34359738367 kB\n\
VmallocUsed:           0 kB\n\
VmallocChunk:          0 kB\n\
HardwareCorrupted:     0 kB\n\
AnonHugePages:         0 kB\n\
ShmemHugePages:        0 kB\n\
ShmemPmdMapped:        0 kB\n\
CmaTotal:              0 kB\n\
CmaFree:               0 kB\n\
HugePages_Total:       0\n\
HugePages_Free:        0\n\
HugePages_Rsvd:        0\n\
HugePages_Surp:        0\n\
Hugepagesize:       2048 kB\n\
DirectMap4k:     3993192 kB\n\
DirectMap2M:    12660736 kB\n\
DirectMap1G:     1048576 kB";

    const MEMORY_USED_PERCENTAGE: f64 = 44.148416198995363;

    fn assert_close(expected: f64, actual: f64) {
        assert!(
            (expected - actual).abs() <= 4.0 * f64::EPSILON * expected.abs(),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn bad_input_is_no_data() {
        assert!(process_meminfo_lines(EMPTY_SAMPLE).is_nan());
        assert!(process_meminfo_lines(GARBAGE_SAMPLE).is_nan());
        assert!(process_meminfo_lines(INCOMPLETE_SAMPLE).is_nan());
    }

    #[test]
    fn complete_sample_yields_percentage() {
        assert_close(MEMORY_USED_PERCENTAGE, process_meminfo_lines(COMPLETE_SAMPLE));
        assert_close(MEMORY_USED_PERCENTAGE, process_meminfo_lines(FULL_SAMPLE));
    }

    #[test]
    fn field_order_is_irrelevant() {
        assert_close(MEMORY_USED_PERCENTAGE, process_meminfo_lines(REORDERED_SAMPLE));
    }

    #[test]
    fn unparseable_value_is_no_data() {
        let text = "MemTotal: lots kB\nMemAvailable: 10 kB\n";
        assert!(process_meminfo_lines(text).is_nan());
    }

    #[test]
    fn zero_total_is_no_data() {
        let text = "MemTotal: 0 kB\nMemAvailable: 0 kB\n";
        assert!(process_meminfo_lines(text).is_nan());
    }

    #[test]
    fn missing_file_is_no_data() {
        let mut source = MemoryMeasurement::with_path("this_will_fail.txt");
        assert!(source.measure().is_nan());
    }

    #[test]
    fn reads_from_file() {
        let path = std::env::temp_dir()
            .join(format!("sysmetrics-meminfo-{}", std::process::id()));
        std::fs::write(&path, FULL_SAMPLE).unwrap();

        let mut source = MemoryMeasurement::with_path(&path);
        assert_close(MEMORY_USED_PERCENTAGE, source.measure());

        let _ = std::fs::remove_file(&path);
    }
}
