//! The two randomized-response stages: permanent and instantaneous.
//!
//! The permanent response (PRR) is the longitudinal privacy layer. Its coins
//! come from a [`ReportRng`] seeded with the client secret, the metric name
//! and the hex-encoded signal, so one client re-encoding one value always
//! reproduces the same PRR, while any change to secret, metric or value
//! reseeds the stream. The stream is consumed in a fixed order: `k` flip
//! coins with probability `f` first, then `k` uniform replacement coins.
//!
//! The instantaneous response (IRR) rerandomizes the PRR with fresh coins on
//! every report: where the permanent bit is 0 the output fires with
//! probability `p`, where it is 1 with probability `q`. The coins are drawn
//! as `k` p-coins followed by `k` q-coins.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::bitvec::BitVector;
use crate::codec;
use crate::prng::{coin_vector, ReportRng};

/// Permanent randomized response for `signal`, memoizable per
/// (secret, metric, value).
pub fn permanent_response(
    signal: &BitVector,
    prob_f: f64,
    secret: &[u8],
    metric_name: &str,
) -> BitVector {
    let signal_hex = codec::to_hex(signal);
    let mut rng =
        ReportRng::from_seed_parts(&[secret, metric_name.as_bytes(), signal_hex.as_bytes()]);
    let num_bits = signal.num_bits();
    let flip_mask = rng.fill(num_bits, prob_f);
    let uniform = rng.fill(num_bits, 0.5);
    BitVector::select(&flip_mask, signal, &uniform).expect("vectors share the signal length")
}

/// Instantaneous randomized response drawn from a caller-supplied source.
pub fn instantaneous_response_with<R: RngCore>(
    prr: &BitVector,
    prob_p: f64,
    prob_q: f64,
    rng: &mut R,
) -> BitVector {
    let num_bits = prr.num_bits();
    let p_coins = coin_vector(rng, num_bits, prob_p);
    let q_coins = coin_vector(rng, num_bits, prob_q);
    BitVector::select(prr, &p_coins, &q_coins).expect("vectors share the response length")
}

/// Instantaneous randomized response with fresh OS-seeded coins.
pub fn instantaneous_response(prr: &BitVector, prob_p: f64, prob_q: f64) -> BitVector {
    let mut rng = ChaCha20Rng::from_entropy();
    instantaneous_response_with(prr, prob_p, prob_q, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_rate(vec: &BitVector) -> f64 {
        vec.count_ones() as f64 / vec.num_bits() as f64
    }

    #[test]
    fn test_prr_known_bytes() {
        let signal = BitVector::from_bytes(vec![4, 0, 0, 1]);
        let prr = permanent_response(&signal, 0.5, b"secret", "name");
        assert_eq!(prr.as_bytes(), &[6, 48, 34, 83]);
    }

    #[test]
    fn test_prr_deterministic() {
        let signal = BitVector::from_bytes(vec![4, 0, 0, 1]);
        let a = permanent_response(&signal, 0.5, b"secret", "name");
        let b = permanent_response(&signal, 0.5, b"secret", "name");
        assert_eq!(a, b);
    }

    #[test]
    fn test_prr_reseeds_on_any_input_change() {
        let signal = BitVector::from_bytes(vec![4, 0, 0, 1]);
        let base = permanent_response(&signal, 0.5, b"secret", "name");

        let other_secret = permanent_response(&signal, 0.5, b"other-secret", "name");
        assert_ne!(base, other_secret);

        let other_name = permanent_response(&signal, 0.5, b"secret", "other-name");
        assert_ne!(base, other_name);

        let other_signal = BitVector::from_bytes(vec![4, 0, 0, 0]);
        let other = permanent_response(&other_signal, 0.5, b"secret", "name");
        assert_ne!(base, other);
    }

    #[test]
    fn test_prr_zero_f_returns_signal() {
        let signal = BitVector::from_bytes(vec![4, 0, 0, 1]);
        let prr = permanent_response(&signal, 0.0, b"secret", "name");
        assert_eq!(prr, signal);
    }

    #[test]
    fn test_prr_full_f_takes_uniform_tail() {
        // f = 1 replaces every bit, and the replacement coins are drawn
        // after the k flip coins.
        let signal = BitVector::from_bytes(vec![4, 0, 0, 1]);
        let prr = permanent_response(&signal, 1.0, b"secret", "name");

        let mut rng = ReportRng::from_seed_parts(&[b"secret", b"name", b"04000001"]);
        let _flips = rng.fill(32, 1.0);
        let uniform = rng.fill(32, 0.5);
        assert_eq!(prr, uniform);
        assert_eq!(prr.as_bytes(), &[50, 48, 238, 219]);
    }

    #[test]
    fn test_prr_set_rate_zero_signal() {
        // A zero bit survives as 1 only via flip-and-replace: f * 1/2.
        let signal = BitVector::zeroed(4096);
        let prr = permanent_response(&signal, 0.5, b"stat-secret", "metric");
        let rate = set_rate(&prr);
        assert!((rate - 0.25).abs() < 0.05, "rate {rate} far from 0.25");
    }

    #[test]
    fn test_prr_set_rate_ones_signal() {
        let signal = BitVector::from_bytes(vec![0xFF; 512]);
        let prr = permanent_response(&signal, 0.5, b"stat-secret", "metric");
        let rate = set_rate(&prr);
        assert!((rate - 0.75).abs() < 0.05, "rate {rate} far from 0.75");
    }

    #[test]
    fn test_irr_known_bytes() {
        let prr = BitVector::from_bytes(vec![6, 48, 34, 83]);
        let mut rng = ChaCha20Rng::from_seed([0x5A; 32]);
        let irr = instantaneous_response_with(&prr, 0.5, 0.75, &mut rng);
        assert_eq!(irr.as_bytes(), &[189, 102, 74, 106]);
    }

    #[test]
    fn test_irr_degenerate_probs_are_exact() {
        let prr = BitVector::from_bytes(vec![6, 48, 34, 83]);
        let mut rng = ChaCha20Rng::from_seed([1; 32]);

        // p = 0, q = 1 transmits the PRR unchanged.
        let identity = instantaneous_response_with(&prr, 0.0, 1.0, &mut rng);
        assert_eq!(identity, prr);

        // p = 1, q = 0 complements it.
        let complement = instantaneous_response_with(&prr, 1.0, 0.0, &mut rng);
        let expected: Vec<u8> = prr.as_bytes().iter().map(|b| b ^ 0xFF).collect();
        assert_eq!(complement.as_bytes(), &expected[..]);
    }

    #[test]
    fn test_irr_rate_where_prr_clear() {
        let prr = BitVector::zeroed(8192);
        let mut rng = ChaCha20Rng::from_seed([0x5A; 32]);
        let irr = instantaneous_response_with(&prr, 0.3, 0.75, &mut rng);
        let rate = set_rate(&irr);
        assert!((rate - 0.3).abs() < 0.05, "rate {rate} far from 0.3");
    }

    #[test]
    fn test_irr_rate_where_prr_set() {
        let prr = BitVector::from_bytes(vec![0xFF; 1024]);
        let mut rng = ChaCha20Rng::from_seed([0xA7; 32]);
        let irr = instantaneous_response_with(&prr, 0.3, 0.75, &mut rng);
        let rate = set_rate(&irr);
        assert!((rate - 0.75).abs() < 0.05, "rate {rate} far from 0.75");
    }

    #[test]
    fn test_irr_entropy_source_is_fresh() {
        let prr = BitVector::zeroed(4096);
        let a = instantaneous_response(&prr, 0.5, 0.5);
        let b = instantaneous_response(&prr, 0.5, 0.5);
        assert_eq!(a.num_bits(), 4096);
        assert_eq!(b.num_bits(), 4096);
        // 4096 independent fair coins agreeing twice is not going to happen.
        assert_ne!(a, b);
    }
}
