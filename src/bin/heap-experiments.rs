//! Heap experiments CLI
//!
//! Runs the three cost experiments on every heap variant and prints the
//! averaged results.
//!
//! # Examples
//!
//! ```bash
//! # Full default session (n = 464646, 20 runs)
//! cargo run --release --bin heap-experiments
//!
//! # Smaller smoke run on two variants, as JSON
//! cargo run --release --bin heap-experiments -- 50000 3 --variant fibonacci --variant binomial --json
//!
//! # Per-run progress and per-experiment details
//! RUST_LOG=debug cargo run --release --bin heap-experiments -- 10000 2
//! ```

use clap::Parser;
use rust_meldable_heaps::experiments::{run_experiments, ExperimentConfig};
use rust_meldable_heaps::HeapVariant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "heap-experiments")]
#[command(about = "Compare binomial, lazy binomial, Fibonacci and cut-based binomial heaps")]
struct Cli {
    /// Size of each random permutation
    #[arg(value_name = "ITEMS")]
    items: Option<usize>,

    /// Number of permutations (runs)
    #[arg(value_name = "RUNS", value_parser = clap::value_parser!(u64).range(1..))]
    runs: Option<u64>,

    /// Seed of the first run; run r uses seed + r
    #[arg(long)]
    seed: Option<u64>,

    /// Only run these variants (repeatable); all four by default
    #[arg(long = "variant", value_name = "VARIANT")]
    variants: Vec<HeapVariant>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config(&self) -> ExperimentConfig {
        let defaults = ExperimentConfig::default();
        ExperimentConfig {
            items: self.items.unwrap_or(defaults.items),
            runs: self.runs.map_or(defaults.runs, |runs| runs as usize),
            seed: self.seed.unwrap_or(defaults.seed),
            variants: if self.variants.is_empty() {
                defaults.variants
            } else {
                self.variants.clone()
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    let report = run_experiments(&config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
