/*!
Utilities for running transmissions without a quantum network.

[`GhzSampler`] reproduces the measurement statistics of GHZ states, optionally with noise,
and hands out [`SimulatedQubit`]s as the local shares.

The [`run_sync()`] function executes the programs of all nodes of a network synchronously
and collects the outcomes; with the `tokio` feature, [`tokio::run_async()`] does the same
with one task per node, talking through an in-memory classical network.
*/

mod ghz;
mod run_sync;

#[cfg(feature = "tokio")]
pub mod tokio;

pub use ghz::{GhzSampler, NoiseModel, SimulatedQubit};
pub use run_sync::{run_sync, ExecutionResult};
