//! Adaptive timing calibration.
//!
//! A measurement is taken in two phases. The warm-up phase runs a small batch
//! of operations, doubling the batch until it takes at least `min_sample` so
//! that timer granularity cannot dominate the estimate. The implied rate is
//! then used to size a bulk batch that fills the rest of the `target`
//! duration. The reported rate covers both phases.

use std::{num::NonZeroU64, time::Duration};

use serde_with::serde_as;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// The repeatable operation whose rate is measured.
///
/// Implemented for every `FnMut() -> Result<()>` closure, so ad-hoc work units
/// can be written inline.
pub trait WorkUnit {
    fn perform(&mut self) -> Result<()>;
}

impl<F> WorkUnit for F
where
    F: FnMut() -> Result<()>,
{
    fn perform(&mut self) -> Result<()> {
        self()
    }
}

/// Monotonic time source used to time batches.
pub trait Clock {
    /// Time since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CalibrationResult {
    pub operations: u64,
    #[serde(rename = "elapsed_us")]
    #[serde_as(as = "serde_with::DurationMicroSeconds")]
    pub elapsed: Duration,
    pub rate_per_second: f64,
}

impl CalibrationResult {
    /// `elapsed` must be non-zero.
    fn new(operations: u64, elapsed: Duration) -> Self {
        debug_assert!(elapsed > Duration::ZERO);
        CalibrationResult {
            operations,
            elapsed,
            rate_per_second: operations as f64 / elapsed.as_secs_f64(),
        }
    }
}

pub const DEFAULT_WARMUP_OPS: u64 = 100;
pub const DEFAULT_MIN_SAMPLE: Duration = Duration::from_millis(10);
pub const DEFAULT_MAX_WARMUP_OPS: u64 = 1 << 32;

pub struct Calibrator<C = MonotonicClock> {
    clock: C,
    target: Duration,
    min_sample: Duration,
    warmup_ops: u64,
    max_warmup_ops: u64,
    max_ops: Option<NonZeroU64>,
}

impl Calibrator<MonotonicClock> {
    pub fn new(target: Duration) -> Self {
        Calibrator {
            clock: MonotonicClock::new(),
            target,
            min_sample: DEFAULT_MIN_SAMPLE,
            warmup_ops: DEFAULT_WARMUP_OPS,
            max_warmup_ops: DEFAULT_MAX_WARMUP_OPS,
            max_ops: None,
        }
    }
}

impl<C: Clock> Calibrator<C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Calibrator<C2> {
        Calibrator {
            clock,
            target: self.target,
            min_sample: self.min_sample,
            warmup_ops: self.warmup_ops,
            max_warmup_ops: self.max_warmup_ops,
            max_ops: self.max_ops,
        }
    }

    pub fn with_min_sample(mut self, min_sample: Duration) -> Self {
        self.min_sample = min_sample;
        self
    }

    /// Size of the first warm-up batch.
    pub fn with_warmup_ops(mut self, warmup_ops: NonZeroU64) -> Self {
        self.warmup_ops = warmup_ops.get();
        self
    }

    /// Largest warm-up batch tried before giving up on the clock.
    pub fn with_max_warmup_ops(mut self, max_warmup_ops: u64) -> Self {
        self.max_warmup_ops = max_warmup_ops;
        self
    }

    /// Caps the total number of invocations, discarded warm-up batches included.
    pub fn with_max_ops(mut self, max_ops: NonZeroU64) -> Self {
        self.max_ops = Some(max_ops);
        self
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    pub fn calibrate<W>(&self, unit: &mut W) -> Result<CalibrationResult>
    where
        W: WorkUnit + ?Sized,
    {
        let mut budget = self.max_ops.map(NonZeroU64::get).unwrap_or(u64::MAX);

        // Phase 1: grow the batch until it is long enough to time reliably.
        let mut batch = self.warmup_ops;
        let (warmup_ops, elapsed1) = loop {
            let ops = batch.min(budget);
            let elapsed = self.timed_batch(unit, ops)?;
            budget -= ops;
            trace!(ops, ?elapsed, "warm-up batch");
            if elapsed >= self.min_sample && elapsed > Duration::ZERO {
                break (ops, elapsed);
            }
            let next = batch
                .checked_mul(2)
                .filter(|next| *next <= self.max_warmup_ops);
            match next {
                Some(next) if budget > 0 => batch = next,
                // out of budget or batch growth; a short sample still gives a rate
                _ if elapsed > Duration::ZERO => {
                    debug!(ops, ?elapsed, "warm-up ended below the minimum sample");
                    break (ops, elapsed);
                }
                _ => return Err(Error::ClockStalled { ops }),
            }
        };

        // Phase 2: fill the rest of the target duration at the observed rate.
        let remaining = if elapsed1 >= self.target {
            0
        } else {
            let rate = warmup_ops as f64 / elapsed1.as_secs_f64();
            // float-to-int casts saturate
            let planned = (self.target.as_secs_f64() * rate).round() as u64;
            planned.saturating_sub(warmup_ops).min(budget)
        };
        debug!(warmup_ops, ?elapsed1, remaining, "calibrated");
        let elapsed2 = if remaining > 0 {
            self.timed_batch(unit, remaining)?
        } else {
            Duration::ZERO
        };

        Ok(CalibrationResult::new(
            warmup_ops + remaining,
            elapsed1 + elapsed2,
        ))
    }

    fn timed_batch<W>(&self, unit: &mut W, ops: u64) -> Result<Duration>
    where
        W: WorkUnit + ?Sized,
    {
        let start = self.clock.now();
        for _ in 0..ops {
            unit.perform()?;
        }
        Ok(self.clock.now().saturating_sub(start))
    }
}

/// Runs `unit` for roughly `target` and returns the measured rate.
pub fn calibrate<W>(
    unit: &mut W,
    target: Duration,
    min_sample: Duration,
) -> Result<CalibrationResult>
where
    W: WorkUnit + ?Sized,
{
    Calibrator::new(target)
        .with_min_sample(min_sample)
        .calibrate(unit)
}
