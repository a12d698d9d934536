//! # Holon IO
//!
//! Persistence layer for holon runs.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - The durable population event log and its readers
//! - JSON and gzip helpers
//! - Lineage registry and trajectory persistence

/// Error types and result aliases for I/O operations
pub mod error;
/// Population event sinks, log readers and summaries
pub mod history;
/// Lineage registry persistence
pub mod registry;
/// Validated JSON serialization helpers
pub mod serialization;
/// Gzip-compressed cycle trajectories
pub mod trajectory;

pub use error::{IoError, Result};
pub use history::{read_events, EventSink, EventSummary, JsonlEventLog, MemorySink};
pub use serialization::{read_json_file, write_json_file};
pub use trajectory::{load_trajectory, save_trajectory, trajectory_hash};
