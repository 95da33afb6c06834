use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(about = "Simulate a RAPPOR client population and collect its reports")]
pub struct Config {
    /// Metric name mixed into every permanent response
    #[arg(long, env = "RAPPOR_SIM_METRIC", default_value = "homepage")]
    pub metric: String,

    /// Encoder parameter file, JSON or CSV by extension (overrides the flags below)
    #[arg(long, env = "RAPPOR_SIM_PARAMS_FILE")]
    pub params_file: Option<PathBuf>,

    /// Bloom filter width in bits
    #[arg(long, env = "RAPPOR_SIM_NUM_BITS", default_value = "16")]
    pub num_bits: usize,

    /// Hash functions per Bloom signal
    #[arg(long, env = "RAPPOR_SIM_NUM_HASHES", default_value = "2")]
    pub num_hashes: usize,

    /// Number of cohorts to spread clients over
    #[arg(long, env = "RAPPOR_SIM_NUM_COHORTS", default_value = "64")]
    pub num_cohorts: u32,

    /// Permanent response noise probability f
    #[arg(long, env = "RAPPOR_SIM_PROB_F", default_value = "0.5")]
    pub prob_f: f64,

    /// Instantaneous probability p of reporting an unset permanent bit as set
    #[arg(long, env = "RAPPOR_SIM_PROB_P", default_value = "0.5")]
    pub prob_p: f64,

    /// Instantaneous probability q of reporting a set permanent bit as set
    #[arg(long, env = "RAPPOR_SIM_PROB_Q", default_value = "0.75")]
    pub prob_q: f64,

    /// Number of simulated clients
    #[arg(long, env = "RAPPOR_SIM_CLIENTS", default_value = "1000")]
    pub clients: usize,

    /// Reports each client submits for its value
    #[arg(long, env = "RAPPOR_SIM_REPORTS_PER_CLIENT", default_value = "7")]
    pub reports_per_client: usize,

    /// True value distribution as value:weight pairs, comma separated
    #[arg(
        long,
        env = "RAPPOR_SIM_VALUES",
        default_value = "google.com:5,facebook.com:3,example.com:2,other.org:1"
    )]
    pub values: String,

    /// Output directory for reports.jsonl and manifest.json
    #[arg(long, env = "RAPPOR_SIM_OUT_DIR", default_value = "./sim-out")]
    pub out_dir: PathBuf,

    /// Master seed; omit for a fresh entropy-seeded run
    #[arg(long, env = "RAPPOR_SIM_SEED")]
    pub seed: Option<u64>,

    /// Encode clients on the rayon thread pool
    #[arg(long, env = "RAPPOR_SIM_PARALLEL")]
    pub parallel: bool,
}

impl Config {
    pub fn reports_path(&self) -> PathBuf {
        self.out_dir.join("reports.jsonl")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.out_dir.join("manifest.json")
    }
}
