//! Comparative cost experiments
//!
//! Every variant runs the same three workloads on the same random
//! permutations of `1..=n`. Run `r` shuffles with seed `seed + r`, and that one
//! permutation is shared by every variant and every experiment of the run, so
//! the variants are compared on identical inputs.
//!
//! Per run we record wall time, the final size and tree count, the lifetime
//! link/cut/heapify counters and the most expensive single operation, where the
//! cost of an operation is the growth of `links + cuts + heapify_cost` across
//! it. Results are averaged per (experiment, variant) with floor division.

use crate::error::HeapError;
use crate::heap::MeldableHeap;
use crate::item::Item;
use crate::policy::HeapVariant;
use crate::traits::CostAccounting;
use crate::Key;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

/// Experiment 2 deletes minima until this many items remain
pub const DRAIN_TARGET: usize = 46;

/// The three workloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Experiment {
    /// Insert the permutation, then one `delete_min`
    InsertThenDeleteMin,
    /// As above, then `delete_min` until [`DRAIN_TARGET`] items remain
    DrainTo46,
    /// As the first, then decrease the largest tenth of the keys to zero and
    /// run one more `delete_min`
    DecreaseLargest,
}

impl Experiment {
    pub const ALL: [Experiment; 3] = [
        Experiment::InsertThenDeleteMin,
        Experiment::DrainTo46,
        Experiment::DecreaseLargest,
    ];

    /// 1-based number used in reports
    pub fn number(self) -> usize {
        match self {
            Experiment::InsertThenDeleteMin => 1,
            Experiment::DrainTo46 => 2,
            Experiment::DecreaseLargest => 3,
        }
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Experiment {}", self.number())
    }
}

/// Parameters of a full experiment session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Size `n` of each permutation
    pub items: usize,
    /// Number of permutations
    pub runs: usize,
    /// Seed of the first run; run `r` uses `seed + r`
    pub seed: u64,
    pub variants: Vec<HeapVariant>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            items: 464_646,
            runs: 20,
            seed: 20_260_115,
            variants: HeapVariant::ALL.to_vec(),
        }
    }
}

/// Measurements of a single run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub time_ms: u64,
    pub final_size: usize,
    pub final_trees: usize,
    pub links: u64,
    pub cuts: u64,
    pub heapify: u64,
    pub max_op_cost: u64,
}

/// Running sums of [`RunStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    sums: RunStats,
    count: usize,
}

impl Aggregate {
    pub fn add(&mut self, stats: &RunStats) {
        self.sums.time_ms += stats.time_ms;
        self.sums.final_size += stats.final_size;
        self.sums.final_trees += stats.final_trees;
        self.sums.links += stats.links;
        self.sums.cuts += stats.cuts;
        self.sums.heapify += stats.heapify;
        self.sums.max_op_cost += stats.max_op_cost;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Per-field averages, rounded down; all zero when nothing was added
    pub fn average(&self) -> RunStats {
        let n = self.count.max(1);
        let n64 = n as u64;
        RunStats {
            time_ms: self.sums.time_ms / n64,
            final_size: self.sums.final_size / n,
            final_trees: self.sums.final_trees / n,
            links: self.sums.links / n64,
            cuts: self.sums.cuts / n64,
            heapify: self.sums.heapify / n64,
            max_op_cost: self.sums.max_op_cost / n64,
        }
    }
}

/// Averaged result of one (experiment, variant) cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub experiment: Experiment,
    pub variant: HeapVariant,
    pub runs: usize,
    pub average: RunStats,
}

/// Everything `run_experiments` produced, in experiment-then-variant order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub config: ExperimentConfig,
    pub results: Vec<ExperimentResult>,
}

impl fmt::Display for ExperimentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "n={}, runs={}", self.config.items, self.config.runs)?;
        writeln!(f, "seed base={}", self.config.seed)?;
        writeln!(f)?;
        write!(f, "===== RESULTS (AVERAGE OVER RUNS) =====")?;

        let mut current = None;
        for result in &self.results {
            if current != Some(result.experiment) {
                current = Some(result.experiment);
                writeln!(f)?;
                writeln!(f)?;
                write!(f, "--- {} ---", result.experiment)?;
            }
            let avg = &result.average;
            writeln!(f)?;
            write!(
                f,
                "{}  ->  time_ms={} | final_size={} | trees={} | links={} | cuts={} | heapify={} | max_op_cost={}",
                result.variant.label(),
                avg.time_ms,
                avg.final_size,
                avg.final_trees,
                avg.links,
                avg.cuts,
                avg.heapify,
                avg.max_op_cost
            )?;
        }
        Ok(())
    }
}

/// A uniformly shuffled permutation of `1..=n`
pub fn make_permutation(n: usize, seed: u64) -> Vec<Key> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys: Vec<Key> = (1..=n as Key).collect();
    keys.shuffle(&mut rng);
    keys
}

/// Runs one experiment on one variant over `perm`
///
/// `perm` is expected to be a permutation of `1..=perm.len()`; experiment 3
/// looks items up by key and skips keys outside that range.
///
/// # Errors
///
/// Propagates heap errors, which only occur if `perm` holds non-positive keys.
pub fn run_single(
    experiment: Experiment,
    variant: HeapVariant,
    perm: &[Key],
) -> Result<RunStats, HeapError> {
    let n = perm.len();
    let mut heap = MeldableHeap::with_variant(variant);
    let mut by_key: Vec<Option<Item<String>>> = match experiment {
        Experiment::DecreaseLargest => vec![None; n + 1],
        _ => Vec::new(),
    };

    let start = Instant::now();
    let mut max_cost = 0;

    for &key in perm {
        let (item, cost) = heap.measure(|heap| heap.insert(key, key.to_string()));
        let item = item?;
        max_cost = max_cost.max(cost);
        if let Some(slot) = usize::try_from(key).ok().and_then(|k| by_key.get_mut(k)) {
            *slot = Some(item);
        }
    }

    if heap.find_min().is_some() {
        let (_, cost) = heap.measure(MeldableHeap::delete_min);
        max_cost = max_cost.max(cost);
    }

    match experiment {
        Experiment::InsertThenDeleteMin => {}
        Experiment::DrainTo46 => {
            while heap.len() > DRAIN_TARGET {
                let (_, cost) = heap.measure(MeldableHeap::delete_min);
                max_cost = max_cost.max(cost);
            }
        }
        Experiment::DecreaseLargest => {
            let m = n / 10;
            for k in (n - m + 1..=n).rev() {
                let Some(item) = by_key[k].as_ref() else {
                    continue;
                };
                let diff = item.key();
                if !item.is_live() || diff <= 0 {
                    continue;
                }
                let (result, cost) = heap.measure(|heap| heap.decrease_key(item, diff));
                result?;
                max_cost = max_cost.max(cost);
            }
            if heap.find_min().is_some() {
                let (_, cost) = heap.measure(MeldableHeap::delete_min);
                max_cost = max_cost.max(cost);
            }
        }
    }

    let elapsed = start.elapsed();
    let counters = heap.counters();
    let stats = RunStats {
        time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        final_size: heap.len(),
        final_trees: heap.num_trees(),
        links: counters.links,
        cuts: counters.cuts,
        heapify: counters.heapify_cost,
        max_op_cost: max_cost,
    };
    debug!(%experiment, %variant, ?stats, "experiment finished");
    Ok(stats)
}

/// Runs every experiment on every configured variant, `config.runs` times
pub fn run_experiments(config: &ExperimentConfig) -> Result<ExperimentReport, HeapError> {
    info!(
        items = config.items,
        runs = config.runs,
        seed = config.seed,
        "starting experiments"
    );
    let mut totals =
        vec![vec![Aggregate::default(); config.variants.len()]; Experiment::ALL.len()];

    for run in 0..config.runs {
        let perm = make_permutation(config.items, config.seed.wrapping_add(run as u64));
        for (e, &experiment) in Experiment::ALL.iter().enumerate() {
            for (v, &variant) in config.variants.iter().enumerate() {
                let stats = run_single(experiment, variant, &perm)?;
                totals[e][v].add(&stats);
            }
        }
        info!(run = run + 1, runs = config.runs, "run done");
    }

    let results = Experiment::ALL
        .iter()
        .zip(&totals)
        .flat_map(|(&experiment, row)| {
            config
                .variants
                .iter()
                .zip(row)
                .map(move |(&variant, aggregate)| ExperimentResult {
                    experiment,
                    variant,
                    runs: aggregate.count(),
                    average: aggregate.average(),
                })
        })
        .collect();

    Ok(ExperimentReport {
        config: config.clone(),
        results,
    })
}
