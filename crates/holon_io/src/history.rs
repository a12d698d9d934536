//! Durable population event log.
//!
//! Every membership change the facade performs becomes one
//! [`PopulationEvent`]. Sinks receive them synchronously; a sink that
//! fails to write surfaces the error to the caller before the operation
//! returns.

use crate::error::{IoError, Result};
use holon_data::{ChangeCause, EventType, PopulationEvent};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Destination for population events.
pub trait EventSink {
    fn record(&mut self, event: &PopulationEvent) -> Result<()>;
}

/// Appends one JSON object per line, flushed after every record.
pub struct JsonlEventLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl JsonlEventLog {
    /// Opens `path` for appending, creating parent directories.
    pub fn new_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                IoError::from(e).with_context(format!("opening event log {}", path.display()))
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlEventLog {
    fn record(&mut self, event: &PopulationEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<PopulationEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PopulationEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, event: &PopulationEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }
}

/// Reads a JSONL event log. Blank and malformed lines are skipped.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<PopulationEvent>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::not_found(path.display().to_string())
        } else {
            IoError::from(e)
        }
    })?;
    let reader = BufReader::new(file);
    let mut events = Vec::new();
    let mut skipped = 0usize;
    for line in reader.lines().map_while(std::result::Result::ok) {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<PopulationEvent>(&line) {
            Ok(event) => events.push(event),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "Skipped malformed event lines");
    }
    Ok(events)
}

/// Aggregate counts over an event log.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EventSummary {
    pub total: usize,
    pub runs: usize,
    pub first_cycle: Option<u64>,
    pub last_cycle: Option<u64>,
    pub adds_by_cause: BTreeMap<ChangeCause, usize>,
    pub removes_by_cause: BTreeMap<ChangeCause, usize>,
    pub adds_by_depth: BTreeMap<usize, usize>,
    pub removes_by_depth: BTreeMap<usize, usize>,
    pub mode_labels: BTreeSet<String>,
}

impl EventSummary {
    pub fn from_events(events: &[PopulationEvent]) -> Self {
        let mut summary = Self::default();
        let mut runs = BTreeSet::new();
        for event in events {
            summary.total += 1;
            runs.insert(event.run_id);
            summary.first_cycle = Some(summary.first_cycle.map_or(event.cycle, |c| c.min(event.cycle)));
            summary.last_cycle = Some(summary.last_cycle.map_or(event.cycle, |c| c.max(event.cycle)));
            if !event.mode_label.is_empty() {
                summary.mode_labels.insert(event.mode_label.clone());
            }
            let (by_cause, by_depth) = match event.event_type {
                EventType::Add => (&mut summary.adds_by_cause, &mut summary.adds_by_depth),
                EventType::Remove => (&mut summary.removes_by_cause, &mut summary.removes_by_depth),
            };
            *by_cause.entry(event.cause).or_insert(0) += 1;
            *by_depth.entry(event.population_index).or_insert(0) += 1;
        }
        summary.runs = runs.len();
        summary
    }

    /// Adds minus removes at each depth, i.e. the final size of each
    /// population when the log covers a whole run from empty.
    pub fn net_by_depth(&self) -> BTreeMap<usize, i64> {
        let mut net = BTreeMap::new();
        for (depth, count) in &self.adds_by_depth {
            *net.entry(*depth).or_insert(0) += *count as i64;
        }
        for (depth, count) in &self.removes_by_depth {
            *net.entry(*depth).or_insert(0) -= *count as i64;
        }
        net
    }
}
