//! Byte-packed bit vectors and the combinators the encoder is built from.
//!
//! A `BitVector` is a fixed-length byte buffer addressed LSB-first: bit `n`
//! lives at `bytes[n / 8]`, position `1 << (n % 8)`. Every stage of the
//! pipeline (Bloom signal, permanent response, instantaneous response) is a
//! vector of the same length, so the combinators check lengths and refuse
//! mismatched operands.
//!
//! `select` is the masked merge used by both randomized-response stages: for
//! each bit position it takes `when_set` where the mask bit is 1 and
//! `when_clear` where it is 0. It is computed bytewise with the branchless
//! form `clear ^ (mask & (set ^ clear))`.

use crate::error::RapporError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVector {
    bytes: Vec<u8>,
}

impl BitVector {
    /// All-zero vector of `num_bits` bits. `num_bits` must be a multiple of 8.
    pub fn zeroed(num_bits: usize) -> Self {
        debug_assert!(num_bits % 8 == 0, "bit length must be a multiple of 8");
        Self {
            bytes: vec![0u8; num_bits / 8],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    pub fn num_bytes(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn num_bits(&self) -> usize {
        self.bytes.len() * 8
    }

    #[inline]
    pub fn set_bit(&mut self, bit: usize) {
        self.bytes[bit / 8] |= 1 << (bit % 8);
    }

    #[inline]
    pub fn get_bit(&self, bit: usize) -> bool {
        (self.bytes[bit / 8] >> (bit % 8)) & 1 == 1
    }

    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Bitwise OR of two equal-length vectors.
    pub fn bitwise_or(&self, other: &Self) -> Result<Self, RapporError> {
        self.check_len(other)?;
        let bytes = self
            .bytes
            .iter()
            .zip(&other.bytes)
            .map(|(a, b)| a | b)
            .collect();
        Ok(Self { bytes })
    }

    /// Bitwise AND of two equal-length vectors.
    pub fn bitwise_and(&self, other: &Self) -> Result<Self, RapporError> {
        self.check_len(other)?;
        let bytes = self
            .bytes
            .iter()
            .zip(&other.bytes)
            .map(|(a, b)| a & b)
            .collect();
        Ok(Self { bytes })
    }

    /// Per-bit merge: where `mask` is set take `when_set`, elsewhere take
    /// `when_clear`. All three vectors must share one length.
    pub fn select(mask: &Self, when_clear: &Self, when_set: &Self) -> Result<Self, RapporError> {
        mask.check_len(when_clear)?;
        mask.check_len(when_set)?;
        let bytes = mask
            .bytes
            .iter()
            .zip(&when_clear.bytes)
            .zip(&when_set.bytes)
            .map(|((m, c), s)| c ^ (m & (s ^ c)))
            .collect();
        Ok(Self { bytes })
    }

    fn check_len(&self, other: &Self) -> Result<(), RapporError> {
        if self.bytes.len() != other.bytes.len() {
            return Err(RapporError::InvalidLength {
                expected: self.bytes.len(),
                got: other.bytes.len(),
            });
        }
        Ok(())
    }
}
