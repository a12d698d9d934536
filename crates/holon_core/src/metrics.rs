//! Run metrics and logging setup.

use holon_data::CycleSnapshot;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cycles between periodic progress lines.
pub const LOG_EVERY: u64 = 100;

/// Counters accumulated over one simulation run.
pub struct Metrics {
    cycle_count: AtomicU64,
    agent_count: AtomicU64,
    composed_total: AtomicU64,
    decomposed_total: AtomicU64,
    depleted_total: AtomicU64,
    pub counters: Mutex<HashMap<String, AtomicU64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cycle_count: AtomicU64::new(0),
            agent_count: AtomicU64::new(0),
            composed_total: AtomicU64::new(0),
            decomposed_total: AtomicU64::new(0),
            depleted_total: AtomicU64::new(0),
            counters: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records a completed cycle.
    pub fn record_cycle(&self, snapshot: &CycleSnapshot, duration: Duration) {
        self.cycle_count.fetch_add(1, Ordering::Relaxed);
        self.agent_count
            .store(snapshot.total_agents() as u64, Ordering::Relaxed);
        self.composed_total
            .fetch_add(snapshot.composed as u64, Ordering::Relaxed);
        self.decomposed_total
            .fetch_add(snapshot.decomposed as u64, Ordering::Relaxed);
        self.depleted_total
            .fetch_add(snapshot.depleted as u64, Ordering::Relaxed);

        let cycles = self.cycle_count.load(Ordering::Relaxed);
        if cycles % LOG_EVERY == 0 {
            tracing::info!(
                cycle = snapshot.cycle,
                agents = snapshot.total_agents(),
                energy = snapshot.total_energy,
                composed = self.composed_total.load(Ordering::Relaxed),
                decomposed = self.decomposed_total.load(Ordering::Relaxed),
                duration_us = duration.as_micros() as u64,
                "Simulation cycle"
            );
        }
    }

    pub fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn agent_count(&self) -> u64 {
        self.agent_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn composed_total(&self) -> u64 {
        self.composed_total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn decomposed_total(&self) -> u64 {
        self.decomposed_total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn depleted_total(&self) -> u64 {
        self.depleted_total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Installs the global fmt subscriber. Later calls are ignored.
pub fn init_logging(level: tracing::Level) {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(level)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(cycle: u64, composed: usize) -> CycleSnapshot {
        CycleSnapshot {
            cycle,
            sizes: vec![3, 1],
            total_energy: 4.0,
            composed,
            decomposed: 0,
            depleted: 1,
        }
    }

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.cycle_count(), 0);
        assert_eq!(metrics.agent_count(), 0);
    }

    #[test]
    fn test_record_cycle_accumulates() {
        let metrics = Metrics::new();
        metrics.record_cycle(&snapshot(0, 2), Duration::from_micros(10));
        metrics.record_cycle(&snapshot(1, 1), Duration::from_micros(10));
        assert_eq!(metrics.cycle_count(), 2);
        assert_eq!(metrics.agent_count(), 4);
        assert_eq!(metrics.composed_total(), 3);
        assert_eq!(metrics.depleted_total(), 2);
    }

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.increment_counter("rule_births");
        metrics.increment_counter("rule_births");
        assert_eq!(metrics.counter("rule_births"), 2);
        assert_eq!(metrics.counter("missing"), 0);
    }
}
