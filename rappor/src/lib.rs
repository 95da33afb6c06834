//! RAPPOR randomized-response encoder
//!
//! This crate provides the client-side RAPPOR pipeline:
//! - `bitvec`: byte-packed bit vectors and the pipeline combinators
//! - `codec`: hex and octet-string conversions
//! - `prng`: seeded coin generator for reproducible noise
//! - `bloom`: cohort-keyed Bloom signal encoding
//! - `params`: encoding parameters and their JSON/CSV formats
//! - `response`: permanent and instantaneous randomized response
//! - `report`: report assembly and host collaborator traits

pub mod bitvec;
pub mod bloom;
pub mod codec;
pub mod error;
pub mod params;
pub mod prng;
pub mod report;
pub mod response;

#[cfg(any(kani, test))]
#[path = "kani_proofs.rs"]
mod kani_proofs;
