/*!
API for the building blocks of the anonymous transmission protocol.

Everything here is sans-IO: the types are state machines that are fed shared-state shares and
classical messages by a driver (see [`session`](`crate::session`)), and never wait on anything themselves.

The pieces, leaves first:
- [`Topology`] resolves a node's neighbours on the line and its broadcast peers;
- [`BitRound`] is one round of the single-bit protocol, from applying the local operations
  to the parity of all broadcast bits;
- [`Handshake`] is the classical round preceding the bit rounds, in which every node
  publishes the [`TransmissionPlan`] it is going to follow;
- [`TransmissionPlan`] enumerates the [`RoundDescriptor`]s of a byte transmission;
- [`MajorityVote`] is the repetition-code corrector applied per bit position;
- [`ByteAssembler`] puts the per-position bits back together into a [`Byte`].
*/

mod byte;
mod errors;
mod handshake;
mod message;
mod plan;
mod quantum;
mod repetition;
mod round;
mod round_id;
mod topology;

pub use byte::{Byte, ByteAssembler, BITS_PER_BYTE};
pub use errors::{ConfigurationError, Error, LocalError, ProtocolError, TimeoutError, ValidationError};
pub use handshake::Handshake;
pub use message::{BitMessage, PlanMessage};
pub use plan::{ProtocolParams, Repetitions, RoundDescriptor, Rounds, TransmissionPlan};
pub use quantum::{LocalQubit, StateMetadata};
pub use repetition::{majority_vote, MajorityVote};
pub use round::{BitRound, PartyId, RoundRecord, RoundState};
pub use round_id::RoundId;
pub use topology::Topology;
