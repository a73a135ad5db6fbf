//! Simulation harness for the `anontx` crate: repeated trials of a transmission over simulated GHZ states,
//! and the statistics the trials are judged by.

pub mod config;
pub mod statistics;
mod trials;

pub use trials::{run_trials, SimulationError, SimulationReport};
