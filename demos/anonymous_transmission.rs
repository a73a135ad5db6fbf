//! Anonymous transmission of a byte over simulated GHZ states.
//!
//! A line of nodes shares a GHZ state per bit round. The sender flips the phase of its share to send a `1`,
//! everyone measures in the Hadamard basis and broadcasts the outcome, and the parity of all broadcasts is the bit.
//! Every receiver learns the byte, but the broadcasts say nothing about who sent it.
//!
//! ## Running the example
//!
//! Run with `RUST_LOG=info cargo run --bin anonymous-transmission [config.json]`.
//! Without a configuration file, Bob sends `11111111` to Alice, Charlie and David with the repetition code on,
//! three times. See [`SimulationConfig`] for the fields of the configuration.

use std::path::Path;

use anontx_demos::{config::SimulationConfig, run_trials, SimulationError};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SimulationError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    info!("Anonymous Transmission Example");

    let path = std::env::args().nth(1);
    let config = SimulationConfig::load(path.as_deref().map(Path::new))?;
    info!(
        "{} sends {} to {:?} ({} trials, correction {})",
        config.sender,
        config.payload,
        config.participants,
        config.trials,
        if config.correction { "on" } else { "off" }
    );

    let report = run_trials(&config)?;

    match report.average_success_probability {
        Some(success) => info!("Average success probability: {success:.4}"),
        None => info!("Nobody received anything"),
    }
    if let Some(speed) = report.average_transmission_speed {
        info!("Average transmission speed: {speed:.2} bits/s");
    }

    let json = serde_json::to_string_pretty(&report)
        .map_err(|err| SimulationError::Config(format!("Cannot serialize the report: {err}")))?;
    println!("{json}");
    Ok(())
}
