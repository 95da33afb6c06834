mod config;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};

use chrono::Utc;
use clap::Parser;
use config::Config;
use eyre::{bail, Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rappor::params::RapporParams;
use rappor::report::{
    CohortStore, Encoder, MemoryCohortStore, MemoryPrrCache, MemorySecretStore, SecretStore,
};
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

const SEED_LABEL_MASTER: &[u8] = b"rappor-sim/master";
const SEED_LABEL_CLIENT: &[u8] = b"rappor-sim/client";

#[derive(Debug, Serialize)]
struct ReportRow {
    client: usize,
    cohort: u32,
    report: String,
}

#[derive(Debug, Serialize)]
struct Manifest {
    metric: String,
    params: RapporParams,
    clients: usize,
    reports_per_client: usize,
    total_reports: usize,
    clients_per_value: BTreeMap<String, usize>,
    generated_at: String,
}

struct ClientReports {
    true_value: String,
    rows: Vec<ReportRow>,
}

/// Entry point: encode a synthetic client population and write the collected
/// reports plus a run manifest to the output directory.
fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cfg = Config::parse();

    let params = load_params(&cfg)?;
    let value_weights = parse_value_weights(&cfg.values)?;
    let total_weight: f64 = value_weights.iter().map(|(_, weight)| weight).sum();

    info!(
        "RAPPOR simulator starting (clients={}, reports/client={}, metric={})",
        cfg.clients, cfg.reports_per_client, cfg.metric
    );
    info!(
        "Encoder params: k={} h={} m={} f={} p={} q={}",
        params.num_bloom_bits,
        params.num_hashes,
        params.num_cohorts,
        params.prob_f,
        params.prob_p,
        params.prob_q
    );

    // 1. Fix the master seed. Every client derives its own stream from it, so
    // seeded runs reproduce bit for bit whether or not --parallel is set.
    let master_seed = match cfg.seed {
        Some(seed) => {
            info!("Deterministic run (seed={})", seed);
            let mut hasher = Sha256::new();
            hasher.update(SEED_LABEL_MASTER);
            hasher.update(seed.to_le_bytes());
            let hash = hasher.finalize();
            let mut out = [0u8; 32];
            out.copy_from_slice(&hash[0..32]);
            out
        }
        None => {
            let mut out = [0u8; 32];
            ChaCha20Rng::from_entropy().fill_bytes(&mut out);
            out
        }
    };

    // 2. Encode the population, one independent client at a time.
    let bar = ProgressBar::new(cfg.clients as u64);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} clients")?
            .progress_chars("#>-"),
    );

    let encode_client = |client: usize| -> Result<ClientReports> {
        let mut rng = ChaCha20Rng::from_seed(derive_client_seed(&master_seed, client as u64));
        let mut secrets = MemorySecretStore::generate(&mut rng);
        let mut cohorts = MemoryCohortStore::assign(&mut rng, params.num_cohorts);
        let encoder = Encoder::new(&cfg.metric, params, secrets.load())?;
        let cohort = cohorts.load();
        let true_value = sample_value(&mut rng, &value_weights, total_weight).to_owned();

        let mut cache = MemoryPrrCache::new();
        let mut rows = Vec::with_capacity(cfg.reports_per_client);
        for _ in 0..cfg.reports_per_client {
            let report = encoder.encode_with(&true_value, cohort, &mut cache, &mut rng);
            rows.push(ReportRow {
                client,
                cohort: report.cohort,
                report: report.report_hex(),
            });
        }
        bar.inc(1);
        Ok(ClientReports { true_value, rows })
    };

    let population: Vec<ClientReports> = if cfg.parallel {
        (0..cfg.clients)
            .into_par_iter()
            .map(encode_client)
            .collect::<Result<_>>()?
    } else {
        (0..cfg.clients).map(encode_client).collect::<Result<_>>()?
    };
    bar.finish_and_clear();

    // 3. Aggregate the ground truth so decoder experiments have a reference.
    let mut clients_per_value: BTreeMap<String, usize> = BTreeMap::new();
    for client in &population {
        *clients_per_value.entry(client.true_value.clone()).or_insert(0) += 1;
    }
    let total_reports: usize = population.iter().map(|client| client.rows.len()).sum();

    // 4. Write reports.jsonl and manifest.json.
    fs::create_dir_all(&cfg.out_dir)
        .wrap_err_with(|| format!("creating output directory {}", cfg.out_dir.display()))?;

    let reports_path = cfg.reports_path();
    let file = File::create(&reports_path)
        .wrap_err_with(|| format!("creating {}", reports_path.display()))?;
    let mut writer = BufWriter::new(file);
    for client in &population {
        for row in &client.rows {
            serde_json::to_writer(&mut writer, row)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;

    let manifest = Manifest {
        metric: cfg.metric.clone(),
        params,
        clients: cfg.clients,
        reports_per_client: cfg.reports_per_client,
        total_reports,
        clients_per_value,
        generated_at: Utc::now().to_rfc3339(),
    };
    let manifest_path = cfg.manifest_path();
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .wrap_err_with(|| format!("writing {}", manifest_path.display()))?;

    info!(
        "Wrote {} reports to {} (manifest: {})",
        total_reports,
        reports_path.display(),
        manifest_path.display()
    );
    Ok(())
}

fn load_params(cfg: &Config) -> Result<RapporParams> {
    match &cfg.params_file {
        None => Ok(RapporParams::new(
            cfg.num_bits,
            cfg.num_hashes,
            cfg.num_cohorts,
            cfg.prob_f,
            cfg.prob_p,
            cfg.prob_q,
        )?),
        Some(path) => {
            let content = fs::read_to_string(path)
                .wrap_err_with(|| format!("reading params file {}", path.display()))?;
            let params = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => RapporParams::from_json(&content)?,
                Some("csv") => RapporParams::from_csv_str(&content)?,
                _ => bail!("params file must have a .json or .csv extension"),
            };
            Ok(params)
        }
    }
}

/// Parses `value:weight` pairs separated by commas; a bare value gets weight 1.
fn parse_value_weights(spec: &str) -> Result<Vec<(String, f64)>> {
    let mut weights = Vec::new();
    for entry in spec.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (value, weight) = match entry.split_once(':') {
            Some((value, weight)) => {
                let weight: f64 = weight
                    .trim()
                    .parse()
                    .wrap_err_with(|| format!("bad weight in {entry:?}"))?;
                (value.trim(), weight)
            }
            None => (entry, 1.0),
        };
        if !weight.is_finite() || weight <= 0.0 {
            bail!("weight must be positive in {entry:?}");
        }
        weights.push((value.to_owned(), weight));
    }
    if weights.is_empty() {
        bail!("--values must name at least one value");
    }
    Ok(weights)
}

fn sample_value<'a, R: Rng>(rng: &mut R, weights: &'a [(String, f64)], total: f64) -> &'a str {
    let mut draw = rng.gen::<f64>() * total;
    for (value, weight) in weights {
        if draw < *weight {
            return value;
        }
        draw -= weight;
    }
    // Float rounding can push the draw past the last band.
    &weights[weights.len() - 1].0
}

fn derive_client_seed(master_seed: &[u8; 32], client: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(master_seed);
    hasher.update(SEED_LABEL_CLIENT);
    hasher.update(client.to_le_bytes());
    let hash = hasher.finalize();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&hash[0..32]);
    seed
}
