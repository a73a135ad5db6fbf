use alloc::{format, string::String, vec::Vec};
use core::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::protocol::{
    BitRound, Byte, ByteAssembler, Error, Handshake, LocalError, LocalQubit, MajorityVote, PartyId, RoundId, RoundState,
    Rounds, StateMetadata, TimeoutError, Topology, TransmissionPlan,
};

use super::transcript::Transcript;

#[derive(Debug)]
enum Stage<Id> {
    Handshake(Handshake<Id>),
    Bit(BitRound<Id>),
}

/// A node's state during a transmission: the handshake, then the bit rounds of the plan.
///
/// The session never waits for anything; a driver performs the I/O and feeds the results in.
/// Every round follows the same order:
/// - if [`needs_shared_state`](`Self::needs_shared_state`) is `true`, establish a share and pass it to
///   [`apply_local_operations`](`Self::apply_local_operations`) and
///   [`record_measurement`](`Self::record_measurement`);
/// - send [`make_broadcast`](`Self::make_broadcast`) to every peer, then call [`broadcast_sent`](`Self::broadcast_sent`);
/// - pass the text received from every peer to [`receive_message`](`Self::receive_message`);
/// - once [`can_finalize`](`Self::can_finalize`), call [`finalize_round`](`Self::finalize_round`).
#[derive(Debug)]
pub struct Session<Id: Ord> {
    topology: Topology<Id>,
    rounds: Rounds,
    stage: Stage<Id>,
    vote: MajorityVote,
    assembler: ByteAssembler,
    transcript: Transcript<Id>,
    generation_time: Duration,
}

/// The outcome of a completed transmission, before it is attributed to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport<Id: Ord> {
    /// The received byte.
    pub byte: Byte,
    /// Everything this node broadcast and received.
    pub transcript: Transcript<Id>,
    /// The total time it took to establish the shared states.
    pub generation_time: Duration,
}

/// Possible results of finalizing a round.
#[derive(Debug)]
pub enum RoundOutcome<Id: Ord> {
    /// The transmission is finished.
    Finished(SessionReport<Id>),
    /// Transitioned to another round.
    AnotherRound {
        /// The session object for the new round.
        session: Session<Id>,
    },
}

impl<Id: PartyId> Session<Id> {
    /// Creates a session starting with the handshake.
    pub fn new(topology: Topology<Id>, plan: &TransmissionPlan) -> Self {
        let handshake = Handshake::new(plan.announcement(), topology.peers());
        Self {
            topology,
            rounds: plan.rounds(),
            stage: Stage::Handshake(handshake),
            vote: MajorityVote::new(plan.repetitions()),
            assembler: ByteAssembler::new(),
            transcript: Transcript::new(),
            generation_time: Duration::ZERO,
        }
    }

    /// This node's identity.
    pub fn id(&self) -> &Id {
        self.topology.id()
    }

    /// The current round.
    pub fn round_id(&self) -> RoundId {
        match &self.stage {
            Stage::Handshake(_) => RoundId::Handshake,
            Stage::Bit(round) => round.id(),
        }
    }

    /// The nodes to broadcast to and receive from, in the order the driver should use.
    pub fn peers(&self) -> &[Id] {
        self.topology.peers()
    }

    /// Returns `true` if the current round is waiting for a share of a shared state.
    pub fn needs_shared_state(&self) -> bool {
        match &self.stage {
            Stage::Handshake(_) => false,
            Stage::Bit(round) => round.state() == RoundState::AwaitSharedState,
        }
    }

    fn bit_round(&mut self) -> Result<&mut BitRound<Id>, LocalError> {
        match &mut self.stage {
            Stage::Bit(round) => Ok(round),
            Stage::Handshake(_) => Err(LocalError::new("The handshake does not use shared states")),
        }
    }

    /// Applies the local operations of the current round to a freshly established share.
    pub fn apply_local_operations(
        &mut self,
        qubit: &mut impl LocalQubit,
        metadata: &StateMetadata,
    ) -> Result<(), LocalError> {
        self.bit_round()?.apply_local_operations(qubit)?;
        self.generation_time += metadata.generation_time;
        Ok(())
    }

    /// Measures the share of the current round.
    pub fn record_measurement(&mut self, qubit: impl LocalQubit) -> Result<(), LocalError> {
        self.bit_round()?.record_measurement(qubit)
    }

    /// Returns the text to send to every peer in the current round.
    pub fn make_broadcast(&self) -> Result<String, LocalError> {
        match &self.stage {
            Stage::Handshake(handshake) => Ok(handshake.make_broadcast()),
            Stage::Bit(round) => Ok(round.make_broadcast()?.to_text()),
        }
    }

    /// Marks the broadcast of the current round as delivered.
    pub fn broadcast_sent(&mut self) -> Result<(), LocalError> {
        match &mut self.stage {
            Stage::Handshake(handshake) => {
                handshake.broadcast_sent();
                Ok(())
            }
            Stage::Bit(round) => round.broadcast_sent(),
        }
    }

    /// Processes the text received from `from` in the current round.
    pub fn receive_message(&mut self, from: &Id, text: &str) -> Result<(), Error<Id>> {
        trace!("{:?}: received {text:?} from {from:?} in {}", self.id(), self.round_id());
        match &mut self.stage {
            Stage::Handshake(handshake) => handshake.receive_message(from, text),
            Stage::Bit(round) => round.receive_message(from, text),
        }
    }

    /// Returns `true` if every message of the current round has been received.
    pub fn can_finalize(&self) -> bool {
        match &self.stage {
            Stage::Handshake(handshake) => handshake.can_finalize(),
            Stage::Bit(round) => round.can_finalize(),
        }
    }

    /// The peers whose messages for the current round have not been received yet.
    pub fn missing_peers(&self) -> Vec<Id> {
        match &self.stage {
            Stage::Handshake(handshake) => handshake.missing_peers(),
            Stage::Bit(round) => round.missing_peers(),
        }
    }

    /// The error to report if the current round cannot complete.
    pub fn timeout_error(&self) -> TimeoutError<Id> {
        TimeoutError {
            round: self.round_id(),
            missing: self.missing_peers(),
        }
    }

    /// Completes the current round and moves on to the next one.
    pub fn finalize_round(self) -> Result<RoundOutcome<Id>, Error<Id>> {
        let Self {
            topology,
            mut rounds,
            stage,
            mut vote,
            mut assembler,
            mut transcript,
            generation_time,
        } = self;

        match stage {
            Stage::Handshake(handshake) => {
                let plan = handshake.finalize()?;
                debug!("{:?}: all peers follow the plan {}", topology.id(), plan.to_text());
            }
            Stage::Bit(round) => {
                let record = round.finalize()?;
                let position = record
                    .round
                    .position()
                    .ok_or_else(|| LocalError::new(format!("{} is not a bit round", record.round)))?;
                debug!("{:?}: {} outcome is {}", topology.id(), record.round, u8::from(record.outcome));
                if let Some(bit) = vote.record(record.outcome)? {
                    debug!("{:?}: bit {position} is {}", topology.id(), u8::from(bit));
                    assembler.push(position, bit)?;
                }
                transcript.push(record)?;
            }
        }

        let descriptor = match rounds.next() {
            Some(descriptor) => descriptor,
            None => {
                return Ok(RoundOutcome::Finished(SessionReport {
                    byte: assembler.finish()?,
                    transcript,
                    generation_time,
                }))
            }
        };

        let round = BitRound::new(&descriptor, topology.peers());
        Ok(RoundOutcome::AnotherRound {
            session: Self {
                topology,
                rounds,
                stage: Stage::Bit(round),
                vote,
                assembler,
                transcript,
                generation_time,
            },
        })
    }
}
