use alloc::string::String;
use core::future::Future;

use crate::protocol::{LocalError, LocalQubit, RoundId, StateMetadata};

/// The source of the shared states, one per bit round.
///
/// Every participant calls [`establish`](`Self::establish`) for the same round concurrently;
/// the call returns once the state exists across the whole line.
/// Any corrections the generation requires are applied by the provider itself.
pub trait SharedStateProvider {
    /// This node's share of a shared state.
    type Qubit: LocalQubit + Send;

    /// Establishes the shared state of `round` and returns the local share.
    fn establish(
        &mut self,
        round: RoundId,
    ) -> impl Future<Output = Result<(Self::Qubit, StateMetadata), LocalError>> + Send;

    /// Commits the operations applied to the shares so far.
    ///
    /// Called after the local operations and after the measurement, before the measured bit is used.
    fn flush(&mut self) -> impl Future<Output = Result<(), LocalError>> + Send {
        async { Ok(()) }
    }
}

/// Ordered, reliable delivery of text between this node and each of its peers.
pub trait ClassicalChannel<Id> {
    /// Sends `text` to `to`.
    fn send(&mut self, to: &Id, text: String) -> impl Future<Output = Result<(), LocalError>> + Send;

    /// Waits for the next text from `from`.
    fn receive(&mut self, from: &Id) -> impl Future<Output = Result<String, LocalError>> + Send;
}
