//! Random block sampling without repetition.
//!
//! A cold-read benchmark must never read the same block twice in a pass: the
//! second read would be served from the page cache. [`SampleSpace`] tracks the
//! blocks handed out so far in a bitset (one bit per block, block counts reach
//! tens of millions), and collisions are resolved by probing with a stride
//! that is coprime with the number of blocks, so every free block is
//! reachable from any starting point.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::{Error, Result};

/// Fixed-size bitset over `[0, len)` that counts its members.
#[derive(Debug, Clone)]
struct VisitedSet {
    words: Vec<u64>,
    len: u64,
    count: u64,
}

impl VisitedSet {
    fn new(len: u64) -> Self {
        VisitedSet {
            words: vec![0; len.div_ceil(64) as usize],
            len,
            count: 0,
        }
    }

    fn locate(&self, idx: u64) -> (usize, u64) {
        debug_assert!(idx < self.len);
        ((idx / 64) as usize, 1 << (idx % 64))
    }

    fn contains(&self, idx: u64) -> bool {
        let (word, mask) = self.locate(idx);
        self.words[word] & mask != 0
    }

    /// Returns `false` if `idx` was already present.
    fn insert(&mut self, idx: u64) -> bool {
        let (word, mask) = self.locate(idx);
        let was_set = self.words[word] & mask != 0;
        self.words[word] |= mask;
        if !was_set {
            self.count += 1;
        }
        !was_set
    }
}

/// The blocks of one pass and which of them have been issued.
#[derive(Debug, Clone)]
pub struct SampleSpace {
    total_blocks: u64,
    stride: u64,
    visited: VisitedSet,
}

impl SampleSpace {
    /// # Panics
    ///
    /// If `total_blocks` is zero.
    pub fn new(total_blocks: u64) -> Self {
        assert!(total_blocks > 0, "sample space must not be empty");
        SampleSpace {
            total_blocks,
            stride: coprime_stride(total_blocks),
            visited: VisitedSet::new(total_blocks),
        }
    }

    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// Number of distinct blocks issued so far.
    pub fn issued(&self) -> u64 {
        self.visited.count
    }

    pub fn is_exhausted(&self) -> bool {
        self.visited.count == self.total_blocks
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Claims the first free block at or after `candidate` along the probe
    /// sequence. Returns the block and the number of probe steps taken.
    fn claim_from(&mut self, candidate: u64) -> Result<(u64, u64)> {
        if self.is_exhausted() {
            return Err(Error::SampleSpaceExhausted {
                total_blocks: self.total_blocks,
            });
        }
        let mut block = candidate % self.total_blocks;
        let mut probes = 0;
        // gcd(stride, total_blocks) == 1, so total_blocks steps visit every block
        while self.visited.contains(block) {
            probes += 1;
            if probes >= self.total_blocks {
                return Err(Error::SampleSpaceExhausted {
                    total_blocks: self.total_blocks,
                });
            }
            block = (block + self.stride) % self.total_blocks;
        }
        let inserted = self.visited.insert(block);
        debug_assert!(inserted);
        Ok((block, probes))
    }
}

/// Draws distinct, uniformly scattered block indices from a [`SampleSpace`].
pub struct BlockSampler<R = StdRng> {
    space: SampleSpace,
    rng: R,
    probes: u64,
}

impl BlockSampler<StdRng> {
    pub fn new(total_blocks: u64) -> Self {
        Self::with_rng(SampleSpace::new(total_blocks), StdRng::from_entropy())
    }
}

impl<R: Rng> BlockSampler<R> {
    pub fn with_rng(space: SampleSpace, rng: R) -> Self {
        BlockSampler {
            space,
            rng,
            probes: 0,
        }
    }

    /// Returns a block index not returned before by this sampler.
    ///
    /// Fails with [`Error::SampleSpaceExhausted`] once every block was issued.
    pub fn next_block(&mut self) -> Result<u64> {
        let candidate = self.rng.gen_range(0..self.space.total_blocks);
        let (block, probes) = self.space.claim_from(candidate)?;
        self.probes += probes;
        Ok(block)
    }

    /// Total probe steps taken to resolve collisions.
    pub fn probes(&self) -> u64 {
        self.probes
    }

    pub fn space(&self) -> &SampleSpace {
        &self.space
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// A stride near `n / phi` with `gcd(stride, n) == 1`.
fn coprime_stride(n: u64) -> u64 {
    let mut stride = ((n as f64 * 0.618_033_988_75) as u64).clamp(1, n);
    while gcd(stride, n) != 1 {
        stride -= 1;
    }
    stride
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn seeded(total_blocks: u64, seed: u64) -> BlockSampler<StdRng> {
        BlockSampler::with_rng(SampleSpace::new(total_blocks), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn stride_is_coprime() {
        for n in 1..2000u64 {
            let stride = coprime_stride(n);
            assert!(stride >= 1 && stride <= n, "n={n} stride={stride}");
            assert_eq!(gcd(stride, n), 1, "n={n} stride={stride}");
        }
        // a fixed stride of 5 shares a factor with both
        assert_eq!(gcd(coprime_stride(10), 10), 1);
        assert_eq!(gcd(coprime_stride(1 << 23), 1 << 23), 1);
    }

    #[test]
    fn drains_whole_space_then_fails() {
        let n = 1000;
        let mut sampler = seeded(n, 7);
        let mut seen = HashSet::new();
        for _ in 0..n {
            let block = sampler.next_block().unwrap();
            assert!(block < n);
            assert!(seen.insert(block), "block {block} issued twice");
        }
        assert!(sampler.space().is_exhausted());
        assert_eq!(sampler.space().issued(), n);
        for _ in 0..3 {
            let err = sampler.next_block().unwrap_err();
            assert!(matches!(err, Error::SampleSpaceExhausted { total_blocks: 1000 }));
        }
    }

    #[test]
    fn single_block_space() {
        let mut sampler = seeded(1, 0);
        assert_eq!(sampler.next_block().unwrap(), 0);
        assert!(sampler.next_block().is_err());
    }

    #[test]
    fn probe_sequence_reaches_last_free_block() {
        // even-sized space with all but one block taken
        let mut space = SampleSpace::new(64);
        for block in (0..64).filter(|b| *b != 37) {
            space.claim_from(block).unwrap();
        }
        for start in 0..64 {
            let mut space = space.clone();
            let (block, _) = space.claim_from(start).unwrap();
            assert_eq!(block, 37);
        }
    }

    #[test]
    fn probes_are_counted() {
        let mut space = SampleSpace::new(8);
        space.claim_from(3).unwrap();
        let (block, probes) = space.claim_from(3).unwrap();
        assert_ne!(block, 3);
        assert_eq!(probes, 1);
        assert_eq!(space.issued(), 2);
    }

    proptest! {
        #[test]
        fn draws_are_distinct_and_in_range(
            n in 1u64..5000,
            frac in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let k = ((n as f64) * frac) as u64;
            let mut sampler = seeded(n, seed);
            let mut seen = HashSet::new();
            for _ in 0..k {
                let block = sampler.next_block().unwrap();
                prop_assert!(block < n);
                prop_assert!(seen.insert(block));
            }
            prop_assert_eq!(sampler.space().issued(), k);
        }

        #[test]
        fn overdraw_is_exhaustion(n in 1u64..300, seed in any::<u64>()) {
            let mut sampler = seeded(n, seed);
            for _ in 0..n {
                sampler.next_block().unwrap();
            }
            let exhausted = matches!(
                sampler.next_block(),
                Err(Error::SampleSpaceExhausted { .. })
            );
            prop_assert!(exhausted);
        }
    }
}
