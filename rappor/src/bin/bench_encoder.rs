//! Benchmark the encoder pipeline stages
//!
//! Compares:
//! 1. Bloom signal construction alone
//! 2. Permanent response (SHA-256 seed + ChaCha20 coins)
//! 3. Full encode with fresh OS entropy per report
//! 4. Memoized encode (warm PRR cache, seeded coins)
//!
//! Run: cargo build --release -p rappor --bin bench_encoder
//!      ./target/release/bench_encoder [--iterations N]

use clap::Parser;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use rappor::bloom;
use rappor::params::RapporParams;
use rappor::report::{Encoder, MemoryPrrCache};
use rappor::response::permanent_response;

#[derive(Parser, Debug)]
#[command(author, version, about = "Benchmark RAPPOR encoder stages")]
struct Args {
    /// Number of operations per stage
    #[arg(long, default_value_t = 10000)]
    iterations: usize,

    /// Report width in bits (k)
    #[arg(long, default_value_t = 16)]
    num_bits: usize,

    /// Bloom hash functions per value (h)
    #[arg(long, default_value_t = 2)]
    num_hashes: usize,

    /// Value to encode
    #[arg(long, default_value = "example.com")]
    value: String,
}

fn main() {
    let args = Args::parse();
    let params = RapporParams::new(args.num_bits, args.num_hashes, 64, 0.5, 0.5, 0.75)
        .expect("valid bench parameters");

    println!("=== RAPPOR Encoder Benchmark ===");
    println!("Iterations: {}", args.iterations);
    println!("k (bits): {}", params.num_bloom_bits);
    println!("h (hashes): {}", params.num_hashes);
    println!("value: {:?}", args.value);
    println!();

    bench_bloom(&args, &params);
    bench_permanent(&args, &params);
    bench_encode_fresh(&args, &params);
    bench_encode_memoized(&args, &params);
}

fn bench_bloom(args: &Args, params: &RapporParams) {
    // Warmup
    for i in 0..100u32 {
        std::hint::black_box(bloom::signal(&args.value, params, i % 64));
    }

    let start = Instant::now();
    for i in 0..args.iterations {
        let cohort = (i % 64) as u32;
        std::hint::black_box(bloom::signal(&args.value, params, cohort));
    }
    let elapsed = start.elapsed();
    println!(
        "  Bloom signal:        {:>8.3} us/op",
        elapsed.as_micros() as f64 / args.iterations as f64
    );
}

fn bench_permanent(args: &Args, params: &RapporParams) {
    let signal = bloom::signal(&args.value, params, 10);

    for _ in 0..100 {
        std::hint::black_box(permanent_response(&signal, params.prob_f, b"bench-secret", "metric"));
    }

    let start = Instant::now();
    for _ in 0..args.iterations {
        std::hint::black_box(permanent_response(&signal, params.prob_f, b"bench-secret", "metric"));
    }
    let elapsed = start.elapsed();
    println!(
        "  Permanent response:  {:>8.3} us/op",
        elapsed.as_micros() as f64 / args.iterations as f64
    );
}

fn bench_encode_fresh(args: &Args, params: &RapporParams) {
    let encoder =
        Encoder::new("metric", *params, b"bench-secret".to_vec()).expect("encoder");

    for _ in 0..100 {
        std::hint::black_box(encoder.encode(&args.value, 10));
    }

    let start = Instant::now();
    for _ in 0..args.iterations {
        std::hint::black_box(encoder.encode(&args.value, 10));
    }
    let elapsed = start.elapsed();
    println!(
        "  Encode (fresh rng):  {:>8.3} us/op",
        elapsed.as_micros() as f64 / args.iterations as f64
    );
}

fn bench_encode_memoized(args: &Args, params: &RapporParams) {
    let encoder =
        Encoder::new("metric", *params, b"bench-secret".to_vec()).expect("encoder");
    let mut cache = MemoryPrrCache::new();
    let mut rng = ChaCha20Rng::from_seed([0x42; 32]);

    // Warm the cache, then measure the hit path only.
    std::hint::black_box(encoder.encode_with(&args.value, 10, &mut cache, &mut rng));

    let start = Instant::now();
    for _ in 0..args.iterations {
        std::hint::black_box(encoder.encode_with(&args.value, 10, &mut cache, &mut rng));
    }
    let elapsed = start.elapsed();
    println!(
        "  Encode (warm cache): {:>8.3} us/op  (hits={})",
        elapsed.as_micros() as f64 / args.iterations as f64,
        cache.hits()
    );
}
