use core::time::Duration;

use serde::{Deserialize, Serialize};

/// The local share of a shared correlated state, as handed out by a shared-state provider.
///
/// A share is used for exactly one round: [`measure`](`Self::measure`) consumes it.
pub trait LocalQubit {
    /// Applies a phase flip (a Pauli Z) to the share.
    fn apply_phase_flip(&mut self);

    /// Applies the basis change (a Hadamard) preceding the measurement.
    fn apply_basis_change(&mut self);

    /// Measures the share in the computational basis.
    ///
    /// The result may only be relied upon after the provider has flushed the pending operations.
    fn measure(self) -> bool;
}

/// Information returned by a shared-state provider along with the local share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMetadata {
    /// The (simulated) time it took to establish the state.
    pub generation_time: Duration,
}
