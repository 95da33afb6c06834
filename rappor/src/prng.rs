//! Seeded coin generator for the randomized-response stages.
//!
//! The permanent response must be reproducible on every machine that holds
//! the same client secret, so the generator is pinned down exactly:
//!
//! - the seed parts are joined with single `0x00` separators and hashed with
//!   SHA-256; the digest keys a ChaCha20 stream
//! - each unit draw takes the next 64-bit output `x` to
//!   `((x >> 11) + 0.5) / 2^53`, strictly inside (0, 1)
//! - a probability-`p` coin fires when the unit draw is `< p`, so `p = 0`
//!   never fires and `p = 1` always fires
//! - `fill` draws one coin per bit, ascending from bit 0
//!
//! The coin helpers are generic over [`RngCore`] so the instantaneous
//! response can run off a caller-supplied entropy source while sharing the
//! same unit mapping.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use crate::bitvec::BitVector;

const INV_TWO_TO_53: f64 = 1.0 / (1u64 << 53) as f64;

#[inline]
pub(crate) fn unit_from_u64(x: u64) -> f64 {
    ((x >> 11) as f64 + 0.5) * INV_TWO_TO_53
}

/// One probability-`p` coin from `rng`.
#[inline]
pub fn coin_flip<R: RngCore>(rng: &mut R, probability: f64) -> bool {
    unit_from_u64(rng.next_u64()) < probability
}

/// Vector of `num_bits` independent probability-`p` coins, bit 0 first.
pub fn coin_vector<R: RngCore>(rng: &mut R, num_bits: usize, probability: f64) -> BitVector {
    let mut vec = BitVector::zeroed(num_bits);
    for bit in 0..num_bits {
        if coin_flip(rng, probability) {
            vec.set_bit(bit);
        }
    }
    vec
}

/// Deterministic generator keyed by a multi-part seed.
pub struct ReportRng {
    rng: ChaCha20Rng,
}

impl ReportRng {
    /// Derive the ChaCha20 key as SHA-256 over `parts` joined with `0x00`.
    pub fn from_seed_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                hasher.update([0u8]);
            }
            hasher.update(part);
        }
        let digest = hasher.finalize();
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        Self {
            rng: ChaCha20Rng::from_seed(seed),
        }
    }

    /// Next uniform draw in (0, 1).
    pub fn next_unit(&mut self) -> f64 {
        unit_from_u64(self.rng.next_u64())
    }

    /// Next probability-`p` coin.
    pub fn next_bit(&mut self, probability: f64) -> bool {
        coin_flip(&mut self.rng, probability)
    }

    /// Next uniform byte.
    pub fn next_byte(&mut self) -> u8 {
        self.rng.next_u32() as u8
    }

    /// Vector of `num_bits` probability-`p` coins from this stream.
    pub fn fill(&mut self, num_bits: usize, probability: f64) -> BitVector {
        coin_vector(&mut self.rng, num_bits, probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = ReportRng::from_seed_parts(&[b"secret", b"name", b"01030700"]);
        let mut b = ReportRng::from_seed_parts(&[b"secret", b"name", b"01030700"]);
        for _ in 0..64 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }

    #[test]
    fn test_part_boundaries_are_significant() {
        // The 0x00 separator keeps ["ab", "c"], ["a", "bc"] and ["abc"] apart.
        let u1 = ReportRng::from_seed_parts(&[b"ab", b"c"]).next_unit();
        let u2 = ReportRng::from_seed_parts(&[b"a", b"bc"]).next_unit();
        let u3 = ReportRng::from_seed_parts(&[b"abc"]).next_unit();
        assert_ne!(u1, u2);
        assert_ne!(u1, u3);
        assert_ne!(u2, u3);
    }

    #[test]
    fn test_known_units() {
        let mut rng = ReportRng::from_seed_parts(&[b"secret", b"name", b"01030700"]);
        let expected = [
            0.5690538776147438,
            0.2805186589682051,
            0.10406567455498555,
            0.7981791381836036,
        ];
        for want in expected {
            let got = rng.next_unit();
            assert!((got - want).abs() < 1e-12, "unit {got} != {want}");
        }
    }

    #[test]
    fn test_known_fill() {
        let mut rng = ReportRng::from_seed_parts(&[b"secret", b"name", b"01030700"]);
        let vec = rng.fill(32, 0.5);
        assert_eq!(vec.as_bytes(), &[182, 9, 44, 238]);
    }

    #[test]
    fn test_known_bytes() {
        let mut rng = ReportRng::from_seed_parts(&[b"seed"]);
        let drawn: Vec<u8> = (0..4).map(|_| rng.next_byte()).collect();
        assert_eq!(drawn, vec![233, 174, 87, 172]);
    }

    #[test]
    fn test_units_stay_inside_open_interval() {
        let mut rng = ReportRng::from_seed_parts(&[b"interval"]);
        for _ in 0..1000 {
            let u = rng.next_unit();
            assert!(u > 0.0 && u < 1.0, "unit {u} outside (0, 1)");
        }
    }

    #[test]
    fn test_degenerate_probabilities() {
        let mut rng = ReportRng::from_seed_parts(&[b"degenerate"]);
        for _ in 0..100 {
            assert!(!rng.next_bit(0.0));
            assert!(rng.next_bit(1.0));
        }
    }

    #[test]
    fn test_coin_frequency_quarter() {
        let mut rng = ReportRng::from_seed_parts(&[b"frequency-check"]);
        let hits = (0..10_000).filter(|_| rng.next_bit(0.25)).count();
        let rate = hits as f64 / 10_000.0;
        assert!((rate - 0.25).abs() < 0.05, "rate {rate} far from 0.25");
    }

    #[test]
    fn test_coin_frequency_three_quarters() {
        let mut rng = ReportRng::from_seed_parts(&[b"frequency-check-75"]);
        let hits = (0..10_000).filter(|_| rng.next_bit(0.75)).count();
        let rate = hits as f64 / 10_000.0;
        assert!((rate - 0.75).abs() < 0.05, "rate {rate} far from 0.75");
    }

    #[test]
    fn test_fill_matches_sequential_coins() {
        let mut fill_rng = ReportRng::from_seed_parts(&[b"order"]);
        let mut coin_rng = ReportRng::from_seed_parts(&[b"order"]);
        let vec = fill_rng.fill(64, 0.3);
        for bit in 0..64 {
            assert_eq!(vec.get_bit(bit), coin_rng.next_bit(0.3), "bit {bit}");
        }
    }
}
