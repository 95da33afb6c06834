//! Hex and octet-string conversions for bit vectors.
//!
//! Reports travel as lowercase hex. `bytes_from_octet_string` is the legacy
//! path for secrets persisted as raw octet strings: each char's low byte
//! becomes one vector byte, so `"fcfc"` decodes to `[102, 99, 102, 99]`, not
//! to the hex bytes `[0xfc, 0xfc]`.

use crate::bitvec::BitVector;
use crate::error::RapporError;

/// Lowercase hex encoding of a vector's bytes.
pub fn to_hex(vec: &BitVector) -> String {
    hex::encode(vec.as_bytes())
}

/// Strict inverse of [`to_hex`]: even length, hex digits only.
pub fn from_hex(s: &str) -> Result<BitVector, RapporError> {
    let bytes = hex::decode(s).map_err(|e| RapporError::MalformedEncoding(e.to_string()))?;
    Ok(BitVector::from_bytes(bytes))
}

/// Interpret each char of `s` as one byte (its code point, truncated).
pub fn bytes_from_octet_string(s: &str) -> BitVector {
    BitVector::from_bytes(s.chars().map(|c| c as u8).collect())
}
