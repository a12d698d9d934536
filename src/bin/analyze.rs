use clap::Parser;
use holon_core::AncestryTree;
use holon_core::LineageRegistry;
use holon_io::registry::LineagePersistence;
use holon_io::{read_events, read_json_file, EventSummary};
use holon_lib::model::ReplicateReport;
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Persisted population event log
    #[arg(short, long, default_value = "logs/events.jsonl")]
    events: PathBuf,

    /// Lineage registry saved by a run, for the ancestry section
    #[arg(short, long)]
    lineage: Option<PathBuf>,

    /// Write the ancestry graph in Graphviz DOT format
    #[arg(long)]
    dot: Option<PathBuf>,

    /// Replicate reports written by `holon --replicates N --output`
    #[arg(long)]
    replicates: Option<PathBuf>,

    #[arg(short, long, default_value = "report.md")]
    output: PathBuf,
}

fn render(summary: &EventSummary, registry: Option<&LineageRegistry>) -> anyhow::Result<String> {
    let mut report = String::new();
    writeln!(report, "# Holon Run Report\n")?;
    writeln!(report, "## Summary")?;
    writeln!(report, "- **Events**: {}", summary.total)?;
    writeln!(report, "- **Runs**: {}", summary.runs)?;
    if let (Some(first), Some(last)) = (summary.first_cycle, summary.last_cycle) {
        writeln!(report, "- **Cycles**: {first}..={last}")?;
    }
    if !summary.mode_labels.is_empty() {
        let labels: Vec<&str> = summary.mode_labels.iter().map(String::as_str).collect();
        writeln!(report, "- **Modes**: {}", labels.join(", "))?;
    }

    writeln!(report, "\n## Changes by cause")?;
    writeln!(report, "| Cause | Adds | Removes |")?;
    writeln!(report, "|-------|------|---------|")?;
    let mut causes: Vec<_> = summary
        .adds_by_cause
        .keys()
        .chain(summary.removes_by_cause.keys())
        .copied()
        .collect();
    causes.sort();
    causes.dedup();
    for cause in causes {
        writeln!(
            report,
            "| {:?} | {} | {} |",
            cause,
            summary.adds_by_cause.get(&cause).copied().unwrap_or(0),
            summary.removes_by_cause.get(&cause).copied().unwrap_or(0)
        )?;
    }

    writeln!(report, "\n## Changes by depth")?;
    writeln!(report, "| Depth | Adds | Removes | Net |")?;
    writeln!(report, "|-------|------|---------|-----|")?;
    for (depth, net) in summary.net_by_depth() {
        writeln!(
            report,
            "| {} | {} | {} | {} |",
            depth,
            summary.adds_by_depth.get(&depth).copied().unwrap_or(0),
            summary.removes_by_depth.get(&depth).copied().unwrap_or(0),
            net
        )?;
    }

    if let Some(registry) = registry {
        writeln!(report, "\n## Lineage")?;
        writeln!(report, "- **Recorded agents**: {}", registry.records.len())?;
        writeln!(report, "- **Alive at save**: {}", registry.living_count())?;
        for (i, record) in registry.largest_clusters(5).iter().enumerate() {
            writeln!(
                report,
                "{}. **{}** - Depth: {}, Energy: {:.3}, Constituents: {}, Offspring: {}",
                i + 1,
                record.id,
                record.birth_depth,
                record.birth_energy,
                record.constituents.len(),
                record.offspring_count
            )?;
        }
    }
    Ok(report)
}

fn render_replicates(reports: &[ReplicateReport]) -> anyhow::Result<String> {
    let mut section = String::new();
    writeln!(section, "\n## Replicates")?;
    writeln!(section, "| Seed | Stop | Cycles | Final sizes | Trajectory hash |")?;
    writeln!(section, "|------|------|--------|-------------|-----------------|")?;
    for report in reports {
        let sizes: Vec<String> = report.final_sizes.iter().map(usize::to_string).collect();
        writeln!(
            section,
            "| {} | {:?} | {} | {} | {} |",
            report.seed,
            report.stop,
            report.trajectory.len(),
            sizes.join(" / "),
            &report.trajectory_hash[..report.trajectory_hash.len().min(12)]
        )?;
    }
    Ok(section)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Analyzing {}...", args.events.display());
    let events = read_events(&args.events)?;
    let summary = EventSummary::from_events(&events);

    let registry = match &args.lineage {
        Some(path) => Some(LineageRegistry::load(path)?),
        None => None,
    };

    if let (Some(registry), Some(dot_path)) = (registry.as_ref(), args.dot.as_ref()) {
        let tree = AncestryTree::build(registry);
        std::fs::write(dot_path, tree.to_dot())?;
        println!("Ancestry graph written: {}", dot_path.display());
    }

    let mut report = render(&summary, registry.as_ref())?;
    if let Some(path) = &args.replicates {
        let reports: Vec<ReplicateReport> = read_json_file(path)?;
        report.push_str(&render_replicates(&reports)?);
    }
    std::fs::write(&args.output, report)?;
    println!("Report generated: {}", args.output.display());

    Ok(())
}
