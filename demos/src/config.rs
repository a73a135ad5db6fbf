//! The simulation configuration, loaded from JSON.

use std::{fs, path::Path};

use anontx::{dev::NoiseModel, protocol::ProtocolParams, session::AnonymousTransmission};
use serde::{Deserialize, Serialize};

use crate::SimulationError;

/// What to simulate.
///
/// Every field has a default, so a configuration file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// The nodes, in line order.
    pub participants: Vec<String>,
    /// The node sending the byte.
    pub sender: String,
    /// The byte to send, as 8 binary digits.
    pub payload: String,
    /// Whether to use the repetition code.
    pub correction: bool,
    /// Protocol parameters shared by all nodes.
    pub params: ProtocolParams,
    /// The number of times the transmission is repeated.
    pub trials: usize,
    /// The noise affecting the shared states.
    pub noise: NoiseModel,
    /// The simulated time it takes to establish one shared state, in microseconds.
    pub generation_time_us: u64,
    /// The seed for all randomness of the simulation; random if not given.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            participants: ["Alice", "Bob", "Charlie", "David"].map(String::from).to_vec(),
            sender: "Bob".into(),
            payload: "11111111".into(),
            correction: true,
            params: ProtocolParams::default(),
            trials: 3,
            noise: NoiseModel::Ideal,
            generation_time_us: 1000,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(text: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(text).map_err(|err| SimulationError::Config(format!("Invalid configuration: {err}")))
    }

    /// Loads the configuration from `path`, or returns the default one if there is no path.
    pub fn load(path: Option<&Path>) -> Result<Self, SimulationError> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .map_err(|err| SimulationError::Config(format!("Cannot read {}: {err}", path.display())))?;
                Self::from_json(&text)
            }
            None => Ok(Self::default()),
        }
    }

    /// Creates the programs of all nodes.
    pub fn programs(&self) -> Result<Vec<AnonymousTransmission<String>>, SimulationError> {
        if !self.participants.contains(&self.sender) {
            return Err(SimulationError::Config(format!(
                "The sender {:?} is not one of the participants",
                self.sender
            )));
        }
        self.participants
            .iter()
            .map(|id| {
                let payload = (*id == self.sender).then_some(self.payload.as_str());
                AnonymousTransmission::new(id.clone(), &self.participants, payload, Some(self.correction))
                    .map(|program| program.with_params(self.params))
                    .map_err(|err| SimulationError::Config(err.to_string()))
            })
            .collect()
    }
}
