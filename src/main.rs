use anyhow::{Context, Result};
use clap::Parser;
use holon_core::{init_logging, SimConfig};
use holon_io::registry::LineagePersistence;
use holon_io::{save_trajectory, trajectory_hash, write_json_file};
use holon_lib::model::{run_replicates, Simulation, StopReason};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path; defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed override (first seed when running replicates)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Max cycles override
    #[arg(long)]
    cycles: Option<u64>,

    /// Number of seed replicates to run in parallel
    #[arg(short, long, default_value_t = 1)]
    replicates: usize,

    /// Output path: gzip trajectory for a single run, JSON reports for replicates
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save the lineage registry of a single run to this JSON file
    #[arg(long)]
    lineage: Option<PathBuf>,

    /// Mode label stored with persisted events
    #[arg(long)]
    label: Option<String>,

    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    fingerprint: String,
    cycles: u64,
    stop: StopReason,
    final_sizes: Vec<usize>,
    total_energy: f64,
    composed: u64,
    decomposed: u64,
    depleted: u64,
    trajectory_hash: String,
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SimConfig::from_toml(&content)?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }
    if let Some(cycles) = args.cycles {
        config.world.max_cycles = cycles;
    }
    if let Some(label) = &args.label {
        config.world.mode_label = label.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run_single(args: &Args, config: SimConfig) -> Result<()> {
    let fingerprint = config.fingerprint();
    let mut sim = Simulation::new(config)?;
    sim.seed_initial()?;
    let stop = sim.run()?;

    if let Some(path) = &args.output {
        save_trajectory(path, sim.trajectory())?;
        tracing::info!(path = %path.display(), "Trajectory saved");
    }
    if let Some(path) = &args.lineage {
        sim.reality().registry().save(path)?;
        tracing::info!(path = %path.display(), "Lineage registry saved");
    }

    let metrics = sim.metrics();
    let summary = RunSummary {
        seed: sim.seed(),
        fingerprint,
        cycles: sim.cycle(),
        stop,
        final_sizes: sim.reality().population_sizes(),
        total_energy: sim.reality().total_energy(),
        composed: metrics.composed_total(),
        decomposed: metrics.decomposed_total(),
        depleted: metrics.depleted_total(),
        trajectory_hash: trajectory_hash(sim.trajectory()),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Consecutive seeds starting at `first`, wrapping at `u64::MAX`.
fn replicate_seeds(first: u64, count: usize) -> Vec<u64> {
    (0..count as u64).map(|i| first.wrapping_add(i)).collect()
}

fn run_batch(args: &Args, config: SimConfig) -> Result<()> {
    let seeds = replicate_seeds(config.world.seed.unwrap_or(0), args.replicates);
    let reports = run_replicates(&config, &seeds)?;

    match &args.output {
        Some(path) => {
            write_json_file(&reports, path)?;
            println!("Wrote {} replicate reports to {}", reports.len(), path.display());
        }
        None => {
            for report in &reports {
                println!(
                    "seed {:>6}  {:?}  cycles {:>5}  sizes {:?}  {}",
                    report.seed,
                    report.stop,
                    report.trajectory.len(),
                    report.final_sizes,
                    &report.trajectory_hash[..12]
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.into());

    let config = load_config(&args)?;
    if args.replicates > 1 {
        run_batch(&args, config)
    } else {
        run_single(&args, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replicate_seeds_are_consecutive() {
        assert_eq!(replicate_seeds(7, 3), vec![7, 8, 9]);
        assert!(replicate_seeds(7, 0).is_empty());
    }

    #[test]
    fn test_replicate_seeds_wrap_at_max() {
        assert_eq!(replicate_seeds(u64::MAX, 2), vec![u64::MAX, 0]);
    }
}
