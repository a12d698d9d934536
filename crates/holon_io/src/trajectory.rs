//! Gzip-compressed JSON trajectories.

use crate::error::{IoError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use holon_data::CycleSnapshot;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub fn save_trajectory<P: AsRef<Path>>(path: P, trajectory: &[CycleSnapshot]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let json = serde_json::to_vec(trajectory)?;
    encoder.write_all(&json)?;
    encoder
        .finish()
        .map_err(|e| IoError::compression(e.to_string()))?
        .flush()?;
    Ok(())
}

pub fn load_trajectory<P: AsRef<Path>>(path: P) -> Result<Vec<CycleSnapshot>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::not_found(path.display().to_string()));
    }
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut data = Vec::new();
    decoder
        .read_to_end(&mut data)
        .map_err(|e| IoError::compression(e.to_string()))?;
    let trajectory = serde_json::from_slice(&data)?;
    Ok(trajectory)
}

/// Digest of the population sizes over a run. Two runs agree on this hash
/// exactly when their size trajectories are identical.
pub fn trajectory_hash(trajectory: &[CycleSnapshot]) -> String {
    let mut hasher = Sha256::new();
    for snapshot in trajectory {
        hasher.update(snapshot.cycle.to_le_bytes());
        for size in &snapshot.sizes {
            hasher.update((*size as u64).to_le_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(cycle: u64, sizes: Vec<usize>) -> CycleSnapshot {
        CycleSnapshot {
            cycle,
            sizes,
            total_energy: 1.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_save_and_load_gzip() {
        let path = std::env::temp_dir()
            .join(format!("holon_traj_{}", uuid::Uuid::new_v4()))
            .join("trajectory.json.gz");
        let trajectory = vec![snapshot(0, vec![4, 0]), snapshot(1, vec![2, 1])];
        save_trajectory(&path, &trajectory).unwrap();
        assert_eq!(load_trajectory(&path).unwrap(), trajectory);
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_energy_totals_reload_bit_exact() {
        let path = std::env::temp_dir()
            .join(format!("holon_traj_{}", uuid::Uuid::new_v4()))
            .join("trajectory.json.gz");
        let trajectory: Vec<CycleSnapshot> = (0..50u64)
            .map(|cycle| CycleSnapshot {
                cycle,
                sizes: vec![1],
                total_energy: 0.1 * cycle as f64 + 1.0 / 3.0,
                ..Default::default()
            })
            .collect();
        save_trajectory(&path, &trajectory).unwrap();
        let loaded = load_trajectory(&path).unwrap();
        for (a, b) in loaded.iter().zip(&trajectory) {
            assert_eq!(a.total_energy.to_bits(), b.total_energy.to_bits());
        }
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_rejects_plain_json() {
        let dir = std::env::temp_dir().join(format!("holon_traj_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("plain.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(load_trajectory(&path), Err(IoError::Compression(_))));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_hash_tracks_sizes() {
        let a = vec![snapshot(0, vec![4, 0]), snapshot(1, vec![2, 1])];
        let mut b = a.clone();
        b[1].total_energy = 99.0;
        assert_eq!(trajectory_hash(&a), trajectory_hash(&b));
        b[1].sizes = vec![3, 1];
        assert_ne!(trajectory_hash(&a), trajectory_hash(&b));
    }
}
