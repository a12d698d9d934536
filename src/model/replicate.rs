//! Seed replicates run in parallel.
//!
//! Each replicate owns its own facade, RNG and metrics, so nothing is
//! shared between threads.

use crate::model::error::Result;
use crate::model::simulation::{Simulation, StopReason};
use holon_core::SimConfig;
use holon_data::CycleSnapshot;
use holon_io::trajectory_hash;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReplicateReport {
    pub seed: u64,
    /// Parameter fingerprint shared by every replicate of one condition.
    pub fingerprint: String,
    pub stop: StopReason,
    pub trajectory_hash: String,
    pub final_sizes: Vec<usize>,
    pub trajectory: Vec<CycleSnapshot>,
}

/// `events.jsonl` becomes `events_seed7.jsonl`.
pub fn replicate_log_path(base: &Path, seed: u64) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "events".to_string());
    let name = match base.extension() {
        Some(ext) => format!("{stem}_seed{seed}.{}", ext.to_string_lossy()),
        None => format!("{stem}_seed{seed}"),
    };
    base.with_file_name(name)
}

/// Runs one seeded replicate to completion.
pub fn run_replicate(config: &SimConfig, seed: u64) -> Result<ReplicateReport> {
    let mut config = config.clone();
    config.world.seed = Some(seed);
    config.world.persistence_target = config
        .world
        .persistence_target
        .as_deref()
        .map(|base| replicate_log_path(base, seed));
    let fingerprint = config.fingerprint();

    let mut sim = Simulation::new(config)?;
    sim.seed_initial()?;
    let stop = sim.run()?;
    let trajectory = sim.trajectory().to_vec();
    Ok(ReplicateReport {
        seed,
        fingerprint,
        stop,
        trajectory_hash: trajectory_hash(&trajectory),
        final_sizes: sim.reality().population_sizes(),
        trajectory,
    })
}

/// Runs one replicate per seed on the rayon pool. Reports come back in
/// `seeds` order; the first failure aborts the batch.
pub fn run_replicates(config: &SimConfig, seeds: &[u64]) -> Result<Vec<ReplicateReport>> {
    tracing::info!(replicates = seeds.len(), "Starting replicate batch");
    seeds
        .par_iter()
        .map(|&seed| run_replicate(config, seed))
        .collect()
}
