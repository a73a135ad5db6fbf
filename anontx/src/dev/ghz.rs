use alloc::{collections::BTreeSet, vec::Vec};
use core::time::Duration;

use rand::Rng;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::protocol::{LocalQubit, RoundId, StateMetadata};

/// A share of a simulated GHZ state.
///
/// Instead of amplitudes, the share holds the outcomes it would give if measured
/// in the computational basis or in the Hadamard basis.
/// This is exact as long as every share of the state is measured in the same basis,
/// which is the case for the anonymous transmission protocol.
#[allow(missing_copy_implementations)] // a share must not be duplicated
#[derive(Debug, PartialEq, Eq)]
pub struct SimulatedQubit {
    z_outcome: bool,
    x_outcome: bool,
}

impl LocalQubit for SimulatedQubit {
    fn apply_phase_flip(&mut self) {
        // Z anticommutes with X and commutes with Z.
        self.x_outcome = !self.x_outcome;
    }

    fn apply_basis_change(&mut self) {
        core::mem::swap(&mut self.z_outcome, &mut self.x_outcome);
    }

    fn measure(self) -> bool {
        self.z_outcome
    }
}

/// The noise affecting the simulated shared states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseModel {
    /// Perfect GHZ states.
    #[default]
    Ideal,
    /// Every share independently suffers a phase flip with the given probability.
    Dephasing {
        /// The probability of a phase flip per share.
        probability: f64,
    },
}

/// Samples the measurement statistics of GHZ states.
///
/// Measured in the computational basis, all shares of a GHZ state agree.
/// Measured in the Hadamard basis, they form a uniformly random string of even parity;
/// every phase flip applied to any of the shares makes the parity odd.
#[derive(Debug, Clone)]
pub struct GhzSampler<R> {
    rng: R,
    noise: NoiseModel,
    corrupted: BTreeSet<RoundId>,
    generation_time: Duration,
}

impl<R: CryptoRngCore> GhzSampler<R> {
    /// Creates an ideal sampler.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            noise: NoiseModel::Ideal,
            corrupted: BTreeSet::new(),
            generation_time: Duration::ZERO,
        }
    }

    /// Sets the noise model.
    pub fn with_noise(self, noise: NoiseModel) -> Self {
        Self { noise, ..self }
    }

    /// Makes the states of the given rounds come out with a phase error on the first share,
    /// in addition to any noise.
    pub fn with_corrupted_rounds(self, rounds: impl IntoIterator<Item = RoundId>) -> Self {
        Self {
            corrupted: rounds.into_iter().collect(),
            ..self
        }
    }

    /// Sets the time reported as spent on generating every state.
    pub fn with_generation_time(self, generation_time: Duration) -> Self {
        Self {
            generation_time,
            ..self
        }
    }

    /// The metadata reported along with every share.
    pub fn metadata(&self) -> StateMetadata {
        StateMetadata {
            generation_time: self.generation_time,
        }
    }

    /// Samples the shares of one state among `parties` nodes.
    pub fn sample(&mut self, round: RoundId, parties: usize) -> Vec<SimulatedQubit> {
        let z_outcome = self.rng.gen::<bool>();

        let mut parity = false;
        let mut shares = (0..parties)
            .map(|index| {
                let x_outcome = if index + 1 == parties {
                    parity
                } else {
                    let outcome = self.rng.gen::<bool>();
                    parity ^= outcome;
                    outcome
                };
                SimulatedQubit { z_outcome, x_outcome }
            })
            .collect::<Vec<_>>();

        if let NoiseModel::Dephasing { probability } = self.noise {
            for share in shares.iter_mut() {
                if self.rng.gen::<f64>() < probability {
                    share.apply_phase_flip();
                }
            }
        }

        if self.corrupted.contains(&round) {
            trace!("Corrupting the state of {round}");
            if let Some(share) = shares.first_mut() {
                share.apply_phase_flip();
            }
        }

        shares
    }
}
