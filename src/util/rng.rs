//! Seeded deterministic random stream
//!
//! One `SimRng` is created per match and threaded explicitly through every
//! decision routine. Draws are consumed in call order, so identical inputs
//! replay identically on every machine.

use crate::util::fixed::{Fp, FRAC_BITS};
use rand::{RngCore, SeedableRng};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const FRACTION_SPAN: u64 = 1 << FRAC_BITS;

/// SplitMix64 generator with fixed-point draws
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    fn next_raw(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1)
    pub fn next_fp(&mut self) -> Fp {
        Fp::from_raw((self.next_raw() >> (64 - FRAC_BITS)) as i64)
    }

    /// Uniform in [min, max); returns `min` for an empty range
    pub fn range_fp(&mut self, min: Fp, max: Fp) -> Fp {
        if max <= min {
            return min;
        }
        let unit = (self.next_raw() >> (64 - FRAC_BITS)) as i128;
        let span = (max - min).raw() as i128;
        min + Fp::from_raw(((span * unit) >> FRAC_BITS) as i64)
    }

    /// Uniform in [min, max], both ends reachable
    pub fn range_fp_inclusive(&mut self, min: Fp, max: Fp) -> Fp {
        if max <= min {
            return min;
        }
        let unit = (self.next_raw() % (FRACTION_SPAN + 1)) as i128;
        let span = (max - min).raw() as i128;
        min + Fp::from_raw(((span * unit) >> FRAC_BITS) as i64)
    }

    /// Uniform integer in [min, max); returns `min` for an empty range
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max as i64 - min as i64) as u64;
        (min as i64 + (self.next_raw() % span) as i64) as i32
    }

    /// Uniform index in [min, max); returns `min` for an empty range
    pub fn range_usize(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        let span = (max - min) as u64;
        min + (self.next_raw() % span) as usize
    }

    pub fn next_bool(&mut self) -> bool {
        self.next_raw() >> 63 == 1
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_raw() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_raw()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SimRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
