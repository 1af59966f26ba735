//! Block-hash seeded random generator shared by every node.
//!
//! The generator keeps a 256-bit integer. Each draw returns `state mod m` and
//! divides the state by `m`; once fewer than roughly 71 bits of entropy remain
//! the seed is rehashed and the state refilled. Both the hash construction and
//! the refill threshold are consensus rules.

use sha2::{Digest, Sha256};

use crate::state::BlockHash;

/// Unsigned 256-bit integer, little-endian 64-bit limbs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct U256([u64; 4]);

impl U256 {
    /// `0x7FFFFF << 48`, the compact form `0x097FFFFF`.
    const REFILL_BELOW: Self = Self([0xFFFF_0000_0000_0000, 0x7F, 0, 0]);

    fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *limb = u64::from_le_bytes(word);
        }
        Self(limbs)
    }

    fn to_le_bytes(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, limb) in bytes.chunks_exact_mut(8).zip(self.0) {
            chunk.copy_from_slice(&limb.to_le_bytes());
        }
        bytes
    }

    /// Divides in place and returns the remainder.
    fn div_rem_small(&mut self, divisor: u64) -> u64 {
        let mut rem: u128 = 0;
        for limb in self.0.iter_mut().rev() {
            let cur = (rem << 64) | u128::from(*limb);
            *limb = (cur / u128::from(divisor)) as u64;
            rem = cur % u128::from(divisor);
        }
        rem as u64
    }

    /// Serialised big-number form: compact-size length, then the little-endian
    /// magnitude with a sign byte appended when the top bit is set.
    fn bignum_bytes(self) -> Vec<u8> {
        let le = self.to_le_bytes();
        let len = le.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        let mut magnitude = le[..len].to_vec();
        if magnitude.last().is_some_and(|b| b & 0x80 != 0) {
            magnitude.push(0);
        }
        let mut out = Vec::with_capacity(magnitude.len() + 1);
        out.push(magnitude.len() as u8);
        out.extend_from_slice(&magnitude);
        out
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Deterministic generator seeded from a block hash.
#[derive(Clone, Debug)]
pub struct StepRng {
    state: U256,
    state0: U256,
}

impl StepRng {
    pub fn new(seed: &BlockHash) -> Self {
        let state0 = U256::from_le_bytes(&sha256d(seed.as_bytes()));
        Self { state: state0, state0 }
    }

    /// Uniform integer in `[0, modulo)`. A non-positive modulo yields 0
    /// without consuming entropy.
    pub fn next(&mut self, modulo: i32) -> i32 {
        if modulo <= 0 {
            debug_assert!(modulo > 0, "rng modulo must be positive");
            return 0;
        }
        if self.state < U256::REFILL_BELOW {
            self.state0 = U256::from_le_bytes(&sha256d(&self.state0.bignum_bytes()));
            self.state = self.state0;
        }
        self.state.div_rem_small(modulo as u64) as i32
    }

    /// Uniform integer in `[a, b]`.
    pub fn range(&mut self, a: i32, b: i32) -> i32 {
        debug_assert!(a <= b);
        self.next(b - a + 1) + a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refill_threshold_matches_compact_encoding() {
        // 0x7FFFFF << 48
        let bytes = U256::REFILL_BELOW.to_le_bytes();
        assert_eq!(&bytes[6..9], &[0xFF, 0xFF, 0x7F]);
        assert!(bytes[..6].iter().chain(&bytes[9..]).all(|b| *b == 0));
    }

    #[test]
    fn bignum_serialisation_appends_sign_byte() {
        let mut v = U256::default();
        assert_eq!(v.bignum_bytes(), vec![0]);
        v.0[0] = 0x80;
        assert_eq!(v.bignum_bytes(), vec![2, 0x80, 0]);
        v.0[0] = 0x1234;
        assert_eq!(v.bignum_bytes(), vec![2, 0x34, 0x12]);
    }

    #[test]
    fn same_seed_same_sequence() {
        let seed = BlockHash::from_bytes([7; 32]);
        let mut a = StepRng::new(&seed);
        let mut b = StepRng::new(&seed);
        let xs: Vec<i32> = (0..500).map(|_| a.next(1000)).collect();
        let ys: Vec<i32> = (0..500).map(|_| b.next(1000)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|x| (0..1000).contains(x)));
    }

    #[test]
    fn division_consumes_the_state() {
        let mut v = U256([100, 0, 0, 0]);
        assert_eq!(v.div_rem_small(7), 2);
        assert_eq!(v, U256([14, 0, 0, 0]));

        let mut big = U256([0, 1, 0, 0]);
        assert_eq!(big.div_rem_small(3), 1);
        assert_eq!(big, U256([0x5555_5555_5555_5555, 0, 0, 0]));
    }
}
