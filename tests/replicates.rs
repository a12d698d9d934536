mod common;

use common::{quick_config, temp_dir};
use holon_core::SimConfig;
use holon_io::{load_trajectory, read_events, save_trajectory, EventSummary};
use holon_lib::model::{run_replicates, Simulation};

#[test]
fn test_replicates_are_reproducible() {
    let config = quick_config(0);
    let first = run_replicates(&config, &[1, 2, 3]).unwrap();
    let second = run_replicates(&config, &[1, 2, 3]).unwrap();
    assert_eq!(first, second);
    assert!(first.iter().all(|r| r.fingerprint == first[0].fingerprint));
}

#[test]
fn test_replicates_write_one_log_per_seed() {
    let dir = temp_dir("holon_replicates");
    let mut config = quick_config(0);
    config.world.max_cycles = 5;
    config.world.persistence_target = Some(dir.join("events.jsonl"));

    let reports = run_replicates(&config, &[4, 9]).unwrap();

    for report in &reports {
        let path = dir.join(format!("events_seed{}.jsonl", report.seed));
        let events = read_events(&path).unwrap();
        let summary = EventSummary::from_events(&events);
        assert_eq!(summary.runs, 1);
        let net = summary.net_by_depth();
        for (depth, size) in report.final_sizes.iter().enumerate() {
            assert_eq!(net.get(&depth).copied().unwrap_or(0), *size as i64);
        }
    }
    assert!(!dir.join("events.jsonl").exists());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_toml_config_drives_simulation() {
    let toml_str = r#"
        [world]
        n_populations = 3
        seed = 21
        max_cycles = 8
        mode_label = "toml"

        [seeding]
        initial_agents = 25

        [energy]
        recharge = { PerDepth = [0.05, 0.02] }
        decay = { Uniform = 0.01 }

        [reproduction]
        enabled = false
    "#;
    let config = SimConfig::from_toml(toml_str).unwrap();
    let mut sim = Simulation::new(config).unwrap();
    sim.seed_initial().unwrap();
    sim.run().unwrap();
    assert_eq!(sim.trajectory().len(), 8);
    assert_eq!(sim.reality().n_populations(), 3);
    assert_eq!(sim.reality().mode_label(), "toml");
}

#[test]
fn test_trajectory_file_round_trip() {
    let mut sim = Simulation::new(quick_config(13)).unwrap();
    sim.seed_initial().unwrap();
    sim.run().unwrap();

    let dir = temp_dir("holon_trajectory");
    let path = dir.join("run.json.gz");
    save_trajectory(&path, sim.trajectory()).unwrap();
    assert_eq!(load_trajectory(&path).unwrap(), sim.trajectory());

    let _ = std::fs::remove_dir_all(dir);
}
