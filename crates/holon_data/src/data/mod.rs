//! Core data structures for the holon simulation.

pub mod event;
pub mod identity;
pub mod stats;
