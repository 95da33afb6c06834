//! Encoding parameters and their JSON / CSV formats.
//!
//! The JSON field names (`numBits`, `probPrr`, ...) and the two-row CSV
//! layout (`k,h,m,p,q,f` header) match the analysis-side tooling, so
//! parameter files can be shared verbatim between the client and the
//! decoder.

use serde::{Deserialize, Serialize};

use crate::error::RapporError;

/// The privacy/utility knobs of one encoder deployment.
///
/// - `num_bloom_bits` (k): report width in bits, must be a multiple of 8
/// - `num_hashes` (h): Bloom hash functions per value
/// - `num_cohorts` (m): client partitions, each with its own hash family
/// - `prob_f` (f): permanent-response flip probability
/// - `prob_p` (p): instantaneous P(1) where the permanent bit is 0
/// - `prob_q` (q): instantaneous P(1) where the permanent bit is 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RapporParams {
    #[serde(rename = "numBits")]
    pub num_bloom_bits: usize,
    #[serde(rename = "numHashes")]
    pub num_hashes: usize,
    #[serde(rename = "numCohorts")]
    pub num_cohorts: u32,
    #[serde(rename = "probPrr")]
    pub prob_f: f64,
    #[serde(rename = "probIrr0")]
    pub prob_p: f64,
    #[serde(rename = "probIrr1")]
    pub prob_q: f64,
}

impl Default for RapporParams {
    fn default() -> Self {
        Self {
            num_bloom_bits: 16,
            num_hashes: 2,
            num_cohorts: 64,
            prob_f: 0.50,
            prob_p: 0.50,
            prob_q: 0.75,
        }
    }
}

impl RapporParams {
    pub fn new(
        num_bloom_bits: usize,
        num_hashes: usize,
        num_cohorts: u32,
        prob_f: f64,
        prob_p: f64,
        prob_q: f64,
    ) -> Result<Self, RapporError> {
        let params = Self {
            num_bloom_bits,
            num_hashes,
            num_cohorts,
            prob_f,
            prob_p,
            prob_q,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), RapporError> {
        if self.num_bloom_bits == 0 {
            return Err(RapporError::InvalidParameters(
                "num_bloom_bits must be greater than 0",
            ));
        }
        if self.num_bloom_bits % 8 != 0 {
            return Err(RapporError::InvalidParameters(
                "num_bloom_bits must be a multiple of 8",
            ));
        }
        if self.num_hashes == 0 {
            return Err(RapporError::InvalidParameters("num_hashes must be at least 1"));
        }
        if self.num_cohorts == 0 {
            return Err(RapporError::InvalidParameters("num_cohorts must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.prob_f) {
            return Err(RapporError::InvalidParameters("prob_f must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.prob_p) {
            return Err(RapporError::InvalidParameters("prob_p must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.prob_q) {
            return Err(RapporError::InvalidParameters("prob_q must be within [0, 1]"));
        }
        Ok(())
    }

    #[inline]
    pub fn num_bloom_bytes(&self) -> usize {
        self.num_bloom_bits / 8
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("plain struct serializes")
    }

    pub fn from_json(s: &str) -> Result<Self, RapporError> {
        let params: Self = serde_json::from_str(s)
            .map_err(|_| RapporError::InvalidParameters("params JSON did not parse"))?;
        params.validate()?;
        Ok(params)
    }

    /// Two-row CSV: `k,h,m,p,q,f` header, then one row of values.
    pub fn to_csv_string(&self) -> String {
        format!(
            "k,h,m,p,q,f\n{},{},{},{},{},{}\n",
            self.num_bloom_bits,
            self.num_hashes,
            self.num_cohorts,
            self.prob_p,
            self.prob_q,
            self.prob_f,
        )
    }

    pub fn from_csv_str(s: &str) -> Result<Self, RapporError> {
        let mut rows = s.lines().filter(|line| !line.trim().is_empty());

        let header = rows
            .next()
            .ok_or(RapporError::InvalidParameters("params CSV is empty"))?;
        if header.trim() != "k,h,m,p,q,f" {
            return Err(RapporError::InvalidParameters(
                "params CSV header must be k,h,m,p,q,f",
            ));
        }

        let row = rows.next().ok_or(RapporError::InvalidParameters(
            "params CSV needs a second row with values",
        ))?;
        if rows.next().is_some() {
            return Err(RapporError::InvalidParameters(
                "params CSV should only have two rows",
            ));
        }

        let fields: Vec<&str> = row.trim().split(',').collect();
        if fields.len() != 6 {
            return Err(RapporError::InvalidParameters(
                "params CSV row must have six fields",
            ));
        }

        let num_bloom_bits = fields[0]
            .trim()
            .parse()
            .map_err(|_| RapporError::InvalidParameters("k is not an integer"))?;
        let num_hashes = fields[1]
            .trim()
            .parse()
            .map_err(|_| RapporError::InvalidParameters("h is not an integer"))?;
        let num_cohorts = fields[2]
            .trim()
            .parse()
            .map_err(|_| RapporError::InvalidParameters("m is not an integer"))?;
        let prob_p = fields[3]
            .trim()
            .parse()
            .map_err(|_| RapporError::InvalidParameters("p is not a number"))?;
        let prob_q = fields[4]
            .trim()
            .parse()
            .map_err(|_| RapporError::InvalidParameters("q is not a number"))?;
        let prob_f = fields[5]
            .trim()
            .parse()
            .map_err(|_| RapporError::InvalidParameters("f is not a number"))?;

        Self::new(num_bloom_bits, num_hashes, num_cohorts, prob_f, prob_p, prob_q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = RapporParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.num_bloom_bytes(), 2);
    }

    #[test]
    fn test_rejects_bad_bit_counts() {
        assert_eq!(
            RapporParams::new(0, 2, 64, 0.5, 0.5, 0.75).unwrap_err(),
            RapporError::InvalidParameters("num_bloom_bits must be greater than 0")
        );
        assert_eq!(
            RapporParams::new(12, 2, 64, 0.5, 0.5, 0.75).unwrap_err(),
            RapporError::InvalidParameters("num_bloom_bits must be a multiple of 8")
        );
    }

    #[test]
    fn test_rejects_zero_hashes_and_cohorts() {
        assert_eq!(
            RapporParams::new(16, 0, 64, 0.5, 0.5, 0.75).unwrap_err(),
            RapporError::InvalidParameters("num_hashes must be at least 1")
        );
        assert_eq!(
            RapporParams::new(16, 2, 0, 0.5, 0.5, 0.75).unwrap_err(),
            RapporError::InvalidParameters("num_cohorts must be at least 1")
        );
    }

    #[test]
    fn test_rejects_out_of_range_probabilities() {
        assert!(RapporParams::new(16, 2, 64, 1.5, 0.5, 0.75).is_err());
        assert!(RapporParams::new(16, 2, 64, 0.5, -0.1, 0.75).is_err());
        assert!(RapporParams::new(16, 2, 64, 0.5, 0.5, 2.0).is_err());
        assert!(RapporParams::new(16, 2, 64, f64::NAN, 0.5, 0.75).is_err());
    }

    #[test]
    fn test_boundary_probabilities_accepted() {
        assert!(RapporParams::new(16, 2, 64, 0.0, 0.0, 1.0).is_ok());
        assert!(RapporParams::new(16, 2, 64, 1.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn test_json_field_names() {
        let json = RapporParams::default().to_json();
        for field in ["numBits", "numHashes", "numCohorts", "probPrr", "probIrr0", "probIrr1"] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
    }

    #[test]
    fn test_json_round_trip_and_fixture() {
        let fixture = r#"{"numBits":16,"numHashes":2,"numCohorts":64,"probPrr":0.5,"probIrr0":0.5,"probIrr1":0.75}"#;
        let parsed = RapporParams::from_json(fixture).expect("fixture parses");
        assert_eq!(parsed, RapporParams::default());

        let back = RapporParams::from_json(&parsed.to_json()).expect("round trip");
        assert_eq!(back, parsed);
    }

    #[test]
    fn test_json_rejects_garbage_and_bad_values() {
        assert!(RapporParams::from_json("not json").is_err());
        let bad = r#"{"numBits":12,"numHashes":2,"numCohorts":64,"probPrr":0.5,"probIrr0":0.5,"probIrr1":0.75}"#;
        assert_eq!(
            RapporParams::from_json(bad).unwrap_err(),
            RapporError::InvalidParameters("num_bloom_bits must be a multiple of 8")
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let params = RapporParams::default();
        let csv = params.to_csv_string();
        assert!(csv.starts_with("k,h,m,p,q,f\n"));
        assert_eq!(RapporParams::from_csv_str(&csv).expect("round trip"), params);
    }

    #[test]
    fn test_csv_fixture() {
        let csv = "k,h,m,p,q,f\n32,2,100,0.25,0.75,0.5\n";
        let params = RapporParams::from_csv_str(csv).expect("fixture parses");
        assert_eq!(params.num_bloom_bits, 32);
        assert_eq!(params.num_hashes, 2);
        assert_eq!(params.num_cohorts, 100);
        assert_eq!(params.prob_p, 0.25);
        assert_eq!(params.prob_q, 0.75);
        assert_eq!(params.prob_f, 0.5);
    }

    #[test]
    fn test_csv_rejects_malformed_input() {
        assert_eq!(
            RapporParams::from_csv_str("").unwrap_err(),
            RapporError::InvalidParameters("params CSV is empty")
        );
        assert_eq!(
            RapporParams::from_csv_str("a,b,c\n1,2,3\n").unwrap_err(),
            RapporError::InvalidParameters("params CSV header must be k,h,m,p,q,f")
        );
        assert_eq!(
            RapporParams::from_csv_str("k,h,m,p,q,f\n").unwrap_err(),
            RapporError::InvalidParameters("params CSV needs a second row with values")
        );
        assert_eq!(
            RapporParams::from_csv_str("k,h,m,p,q,f\n16,2,64,0.5,0.75,0.5\n1,2,3,4,5,6\n")
                .unwrap_err(),
            RapporError::InvalidParameters("params CSV should only have two rows")
        );
        assert_eq!(
            RapporParams::from_csv_str("k,h,m,p,q,f\nsixteen,2,64,0.5,0.75,0.5\n").unwrap_err(),
            RapporError::InvalidParameters("k is not an integer")
        );
        assert_eq!(
            RapporParams::from_csv_str("k,h,m,p,q,f\n16,2,64,0.5,0.75\n").unwrap_err(),
            RapporError::InvalidParameters("params CSV row must have six fields")
        );
    }
}
