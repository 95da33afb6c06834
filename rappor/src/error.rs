//! Error type shared across the encoding pipeline.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RapporError {
    /// Two bit vectors passed to a combinator had different lengths.
    InvalidLength { expected: usize, got: usize },
    /// A hex string could not be decoded back into a bit vector.
    MalformedEncoding(String),
    /// Encoding parameters violate a structural invariant.
    InvalidParameters(&'static str),
}

impl Display for RapporError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLength { expected, got } => {
                write!(f, "bit vector length mismatch: expected {expected} bytes, got {got}")
            }
            Self::MalformedEncoding(msg) => write!(f, "malformed encoding: {msg}"),
            Self::InvalidParameters(msg) => write!(f, "invalid params: {msg}"),
        }
    }
}

impl Error for RapporError {}
