//! CPU-bound work units.

use std::hint::black_box;

use crate::{
    calibrate::WorkUnit,
    crc::{ccitt_crc16, crc16_finish, CRC16_SEED},
    error::Result,
};

/// Checksums a fixed buffer, feeding each result back in as the next seed.
pub struct Crc16Workload {
    buf: Vec<u8>,
    crc: u16,
}

impl Crc16Workload {
    pub const DEFAULT_LEN: usize = 32 * 1024;

    pub fn new(len: usize) -> Self {
        Crc16Workload {
            buf: (0..len).map(|i| (i & 0xFF) as u8).collect(),
            crc: CRC16_SEED,
        }
    }

    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    /// Finished checksum over everything processed so far.
    pub fn checksum(&self) -> u16 {
        crc16_finish(self.crc)
    }
}

impl WorkUnit for Crc16Workload {
    fn perform(&mut self) -> Result<()> {
        self.crc = ccitt_crc16(black_box(&self.buf), self.crc);
        Ok(())
    }
}

const HORNER_COEFFS: [f64; 8] = [0.0625, -0.125, 0.25, -0.5, 1.0, -1.5, 2.0, -2.5];

/// Evaluates a fixed polynomial at every point of a buffer and accumulates
/// the values.
pub struct HornerWorkload {
    xs: Vec<f64>,
    sum: f64,
}

impl HornerWorkload {
    pub const DEFAULT_LEN: usize = 4096;

    /// Points are spread evenly over `[-1, 1)`.
    pub fn new(len: usize) -> Self {
        let step = 2.0 / len.max(1) as f64;
        HornerWorkload {
            xs: (0..len).map(|i| i as f64 * step - 1.0).collect(),
            sum: 0.0,
        }
    }

    pub fn buffer_len(&self) -> usize {
        self.xs.len()
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }
}

fn horner(x: f64) -> f64 {
    HORNER_COEFFS.iter().fold(0.0, |acc, c| acc * x + c)
}

impl WorkUnit for HornerWorkload {
    fn perform(&mut self) -> Result<()> {
        let pass: f64 = black_box(&self.xs).iter().map(|&x| horner(x)).sum();
        self.sum += pass;
        Ok(())
    }
}
