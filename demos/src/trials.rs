use std::{collections::BTreeMap, time::Duration};

use anontx::{
    dev::{run_sync, GhzSampler},
    protocol::Byte,
};
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::{config::SimulationConfig, statistics::Statistics};

/// Errors of the simulation harness.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// Configuration error: {0}
    Config(String),
    /// Trial {trial} failed: {message}
    Trial {
        /// The index of the failed trial.
        trial: usize,
        /// What went wrong.
        message: String,
    },
}

/// The outcome of all trials.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// The byte the sender sent.
    pub sent: Byte,
    /// The bytes every node received, per trial.
    pub received: Vec<BTreeMap<String, Byte>>,
    /// The average fraction of correctly received bits.
    pub average_success_probability: Option<f64>,
    /// The average speed in bits per second of simulated time.
    pub average_transmission_speed: Option<f64>,
}

/// Runs the transmission configured by `config` as many times as it says.
pub fn run_trials(config: &SimulationConfig) -> Result<SimulationReport, SimulationError> {
    let sent = config
        .payload
        .parse::<Byte>()
        .map_err(|err| SimulationError::Config(err.to_string()))?;

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let sampler_rng =
        ChaCha8Rng::from_rng(&mut rng).map_err(|err| SimulationError::Config(format!("Cannot seed the sampler: {err}")))?;
    let mut sampler = GhzSampler::new(sampler_rng)
        .with_noise(config.noise)
        .with_generation_time(Duration::from_micros(config.generation_time_us));

    let mut statistics = Statistics::default();
    let mut received = Vec::with_capacity(config.trials);

    for trial in 0..config.trials {
        debug!("Starting trial {trial}");
        let execution = run_sync(&mut rng, &mut sampler, config.programs()?).map_err(|err| SimulationError::Trial {
            trial,
            message: err.to_string(),
        })?;

        let mut bytes = BTreeMap::new();
        for (id, result) in execution.results {
            let result = result.map_err(|err| SimulationError::Trial {
                trial,
                message: format!("{id}: {err}"),
            })?;
            info!("Trial {trial}: {id} received {} at {:?}", result.received_byte, result.elapsed);
            if id != config.sender {
                statistics.record(&sent, &result.received_byte, result.elapsed);
            }
            bytes.insert(id, result.received_byte);
        }
        received.push(bytes);
    }

    Ok(SimulationReport {
        sent,
        received,
        average_success_probability: statistics.average_success_probability(),
        average_transmission_speed: statistics.average_transmission_speed(),
    })
}
