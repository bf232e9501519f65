//! Human-readable throughput formatting.

use std::fmt::Write;

use crate::calibrate::CalibrationResult;

/// One row of a benchmark's final table.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BenchmarkResult {
    pub label: String,
    pub chunk_size_bytes: u64,
    pub bytes_per_second: f64,
}

impl BenchmarkResult {
    pub fn new(chunk_size_bytes: u64, result: &CalibrationResult) -> Self {
        BenchmarkResult {
            label: chunk_label(chunk_size_bytes),
            chunk_size_bytes,
            bytes_per_second: result.rate_per_second * chunk_size_bytes as f64,
        }
    }
}

/// `rate * unit_size` in scaled byte units, or the raw operation rate when
/// there is no meaningful unit size.
pub fn format_throughput(result: &CalibrationResult, unit_size_bytes: Option<u64>) -> String {
    match unit_size_bytes {
        Some(size) => format_bytes_per_second(result.rate_per_second * size as f64),
        None => format!("{:.0}/second", result.rate_per_second),
    }
}

pub fn format_bytes_per_second(bytes_per_second: f64) -> String {
    const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];
    let mut value = bytes_per_second;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}/sec", UNITS[unit])
}

/// `1K`, `256K`, `4M`; sizes that aren't whole KiB are printed as is.
pub fn chunk_label(bytes: u64) -> String {
    const MIB: u64 = 1 << 20;
    const KIB: u64 = 1 << 10;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}M", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}K", bytes / KIB)
    } else {
        bytes.to_string()
    }
}

/// One `"<label> reads: <rate>"` line per result.
pub fn render_table(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    for r in results {
        // writing to a String cannot fail
        let _ = writeln!(
            out,
            "{} reads: {}",
            r.label,
            format_bytes_per_second(r.bytes_per_second)
        );
    }
    out
}
