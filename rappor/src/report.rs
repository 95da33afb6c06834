//! Report assembly and the host collaborators around the encoder.
//!
//! [`Encoder`] ties the pipeline together for one metric on one client:
//! Bloom signal, permanent response, instantaneous response, report. The
//! host supplies the durable pieces through small traits: a [`SecretStore`]
//! for the client secret, a [`CohortStore`] for the one-time cohort
//! assignment, a [`PrrCache`] to memoize permanent responses and a
//! [`ReportSink`] that carries finished reports to telemetry. In-memory
//! implementations of all four are provided for tests and simulations.

use std::collections::HashMap;

use rand::{Rng, RngCore};

use crate::bitvec::BitVector;
use crate::bloom;
use crate::codec;
use crate::error::RapporError;
use crate::params::RapporParams;
use crate::response::{instantaneous_response, instantaneous_response_with, permanent_response};

/// Length of a freshly generated client secret, in bytes.
pub const SECRET_LENGTH: usize = 32;

/// One finished report: the client's cohort and the noised bit vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RapporReport {
    pub cohort: u32,
    pub report: BitVector,
}

impl RapporReport {
    /// Report bytes as lowercase hex, the transport form.
    pub fn report_hex(&self) -> String {
        codec::to_hex(&self.report)
    }
}

/// Durable per-client secret. `load` may generate on first use.
pub trait SecretStore {
    fn load(&mut self) -> Vec<u8>;
}

/// Durable per-client cohort assignment. `load` may assign on first use.
pub trait CohortStore {
    fn load(&mut self) -> u32;
}

/// Destination for finished reports.
pub trait ReportSink {
    fn submit(&mut self, report: RapporReport);
}

/// Memoized permanent responses, keyed by reported value.
///
/// A cache instance is scoped to one encoder (one secret and metric) and
/// assumes the client's cohort is stable, which holds when the cohort comes
/// from a [`CohortStore`]. Entries never expire: the whole point is that one
/// value keeps one permanent response for the lifetime of the client.
pub trait PrrCache {
    fn load(&mut self, value: &str) -> Option<BitVector>;
    fn store(&mut self, value: &str, prr: &BitVector);
}

/// Encoder for one metric on one client.
#[derive(Debug)]
pub struct Encoder {
    metric_name: String,
    params: RapporParams,
    secret: Vec<u8>,
}

impl Encoder {
    pub fn new(
        metric_name: &str,
        params: RapporParams,
        secret: Vec<u8>,
    ) -> Result<Self, RapporError> {
        params.validate()?;
        if secret.is_empty() {
            return Err(RapporError::InvalidParameters("secret must not be empty"));
        }
        Ok(Self {
            metric_name: metric_name.to_owned(),
            params,
            secret,
        })
    }

    pub fn params(&self) -> &RapporParams {
        &self.params
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Encode one report with fresh OS-seeded instantaneous coins.
    pub fn encode(&self, value: &str, cohort: u32) -> RapporReport {
        let prr = self.permanent_for(value, cohort);
        let report = instantaneous_response(&prr, self.params.prob_p, self.params.prob_q);
        RapporReport { cohort, report }
    }

    /// Encode one report, memoizing the permanent response in `cache` and
    /// drawing instantaneous coins from `rng`.
    ///
    /// On a cache hit the Bloom and permanent stages are skipped entirely.
    pub fn encode_with<P: PrrCache, R: RngCore>(
        &self,
        value: &str,
        cohort: u32,
        cache: &mut P,
        rng: &mut R,
    ) -> RapporReport {
        let prr = match cache.load(value) {
            Some(prr) => prr,
            None => {
                let prr = self.permanent_for(value, cohort);
                cache.store(value, &prr);
                prr
            }
        };
        let report = instantaneous_response_with(&prr, self.params.prob_p, self.params.prob_q, rng);
        RapporReport { cohort, report }
    }

    fn permanent_for(&self, value: &str, cohort: u32) -> BitVector {
        let signal = bloom::signal(value, &self.params, cohort);
        permanent_response(&signal, self.params.prob_f, &self.secret, &self.metric_name)
    }
}

/// One report event: load the client state, encode, hand off to telemetry.
pub fn submit_report<S, C, P, K, R>(
    metric_name: &str,
    value: &str,
    params: RapporParams,
    secrets: &mut S,
    cohorts: &mut C,
    cache: &mut P,
    sink: &mut K,
    rng: &mut R,
) -> Result<(), RapporError>
where
    S: SecretStore,
    C: CohortStore,
    P: PrrCache,
    K: ReportSink,
    R: RngCore,
{
    let encoder = Encoder::new(metric_name, params, secrets.load())?;
    let cohort = cohorts.load();
    let report = encoder.encode_with(value, cohort, cache, rng);
    sink.submit(report);
    Ok(())
}

/// Secret store backed by a plain byte vector.
pub struct MemorySecretStore {
    secret: Vec<u8>,
}

impl MemorySecretStore {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Generate a fresh [`SECRET_LENGTH`]-byte secret from `rng`.
    pub fn generate<R: RngCore>(rng: &mut R) -> Self {
        let mut secret = vec![0u8; SECRET_LENGTH];
        rng.fill_bytes(&mut secret);
        Self { secret }
    }
}

impl SecretStore for MemorySecretStore {
    fn load(&mut self) -> Vec<u8> {
        self.secret.clone()
    }
}

/// Cohort store holding one fixed assignment.
pub struct MemoryCohortStore {
    cohort: u32,
}

impl MemoryCohortStore {
    pub fn new(cohort: u32) -> Self {
        Self { cohort }
    }

    /// Assign a cohort uniformly from `[0, num_cohorts)`.
    pub fn assign<R: Rng>(rng: &mut R, num_cohorts: u32) -> Self {
        Self {
            cohort: rng.gen_range(0..num_cohorts),
        }
    }
}

impl CohortStore for MemoryCohortStore {
    fn load(&mut self) -> u32 {
        self.cohort
    }
}

/// Sink that records submitted reports in order.
#[derive(Default)]
pub struct MemoryReportSink {
    reports: Vec<RapporReport>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[RapporReport] {
        &self.reports
    }
}

impl ReportSink for MemoryReportSink {
    fn submit(&mut self, report: RapporReport) {
        self.reports.push(report);
    }
}

/// Hash-map cache with a hit counter.
#[derive(Default)]
pub struct MemoryPrrCache {
    entries: HashMap<String, BitVector>,
    hits: usize,
}

impl MemoryPrrCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

impl PrrCache for MemoryPrrCache {
    fn load(&mut self, value: &str) -> Option<BitVector> {
        let found = self.entries.get(value).cloned();
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    fn store(&mut self, value: &str, prr: &BitVector) {
        self.entries.insert(value.to_owned(), prr.clone());
    }
}
