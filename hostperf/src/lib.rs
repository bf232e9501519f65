//! This crate measures CPU and disk throughput of the host it runs on.
//!
//! # Usage
//!
//! 1. Pick or write a [`WorkUnit`]: a repeatable operation with roughly
//!    constant cost per call. Closures returning [`Result<()>`](Result) are
//!    work units.
//! 2. Build a [`Calibrator`] with the target duration of the measurement.
//! 3. Call [`Calibrator::calibrate`]; it warms up, sizes a bulk batch from the
//!    warm-up rate and returns a [`CalibrationResult`].
//! 4. Format the rate with [`format_throughput`].
//!
//! Disk work units that must not hit the page cache draw their offsets from a
//! [`BlockSampler`], which never returns the same block twice in a pass.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use hostperf::{format_throughput, Calibrator, Crc16Workload};
//!
//! let mut work = Crc16Workload::new(4096);
//! let result = Calibrator::new(Duration::from_millis(50))
//!     .calibrate(&mut work)
//!     .unwrap();
//! assert!(result.operations > 0);
//! println!("crc16 {:04X}: {}", work.checksum(), format_throughput(&result, None));
//! ```
//!
//! Nothing in here prints to stdout or exits the process; failures come back
//! as [`Error`] values and diagnostics are emitted through `tracing`.

pub mod calibrate;
pub mod crc;
mod error;
pub mod reader;
pub mod report;
pub mod sampler;
pub mod scratch;
pub mod workload;

pub use calibrate::{calibrate, CalibrationResult, Calibrator, Clock, MonotonicClock, WorkUnit};
pub use error::{Error, IoOp, Result};
pub use reader::{RandomBlockReader, WrappingReader};
pub use report::{
    chunk_label, format_bytes_per_second, format_throughput, render_table, BenchmarkResult,
};
pub use sampler::{BlockSampler, SampleSpace};
pub use workload::{Crc16Workload, HornerWorkload};
