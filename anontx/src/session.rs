/*!
API for running a node's part of an anonymous transmission.

[`AnonymousTransmission`] is the program a node runs: it resolves the node's place in the network,
validates the payload, and produces a [`Session`], the state machine that goes through the handshake
and the bit rounds. A driver feeds the session with shares from a [`SharedStateProvider`]
and with messages from a [`ClassicalChannel`]; [`tokio::run_session`] is one such driver.
*/

mod program;
#[allow(clippy::module_inception)]
mod session;
mod transcript;
mod transport;

#[cfg(any(test, feature = "tokio"))]
pub mod tokio;

pub use program::{AnonymousTransmission, RunResult};
pub use session::{RoundOutcome, Session, SessionReport};
pub use transcript::Transcript;
pub use transport::{ClassicalChannel, SharedStateProvider};
