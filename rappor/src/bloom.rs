//! Cohort-keyed Bloom signal encoding.
//!
//! Each of the `h` hash functions hashes the decimal cohort number, the
//! decimal hash index and the value's UTF-8 bytes with SHA-256, then reduces
//! the trailing 8 digest bytes (big-endian) modulo `k`. Distinct cohorts
//! therefore draw from distinct hash families, which is what lets the
//! decoder cross-check candidate values across cohorts.
//!
//! This construction is part of the wire contract: the analysis side must
//! reproduce the exact bit positions to build its candidate matrix.

use sha2::{Digest, Sha256};

use crate::bitvec::BitVector;
use crate::params::RapporParams;

/// Bloom signal for `value` in `cohort`: up to `h` bits set out of `k`.
///
/// Hash collisions can land two hash indices on one bit, so the result has
/// between 1 and `h` bits set.
pub fn signal(value: &str, params: &RapporParams, cohort: u32) -> BitVector {
    let mut vec = BitVector::zeroed(params.num_bloom_bits);
    for hash_index in 0..params.num_hashes {
        vec.set_bit(bit_position(value, params.num_bloom_bits, cohort, hash_index));
    }
    vec
}

/// Bit position of one hash function, in `[0, num_bits)`.
pub fn bit_position(value: &str, num_bits: usize, cohort: u32, hash_index: usize) -> usize {
    let mut hasher = Sha256::new();
    hasher.update(cohort.to_string());
    hasher.update(hash_index.to_string());
    hasher.update(value);
    let digest = hasher.finalize();
    let tail = u64::from_be_bytes(digest[24..32].try_into().unwrap());
    (tail % num_bits as u64) as usize
}
