use alloc::{collections::BTreeMap, format, vec::Vec};
use core::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{
    errors::{Error, LocalError, ProtocolError},
    message::BitMessage,
    plan::RoundDescriptor,
    quantum::LocalQubit,
    round_id::RoundId,
};

/// A node identifier.
pub trait PartyId: 'static + Debug + Clone + Ord + Send + Sync + Serialize + for<'de> Deserialize<'de> {}

impl<T> PartyId for T where T: 'static + Debug + Clone + Ord + Send + Sync + Serialize + for<'de> Deserialize<'de> {}

/// The stages of a [`BitRound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Waiting for the shared state of this round to be established.
    AwaitSharedState,
    /// The local operations were applied to the share; the measurement may be recorded.
    LocalOperationApplied,
    /// The measured bit went out to every peer; nothing has been received yet.
    BroadcastSent,
    /// Some, but not all, peers' bits have been received.
    AwaitingPeerMessages,
    /// Every peer's bit has been received; the round can be finalized.
    RoundComplete,
}

/// One round of the single-bit anonymous transmission protocol, as seen by one node.
///
/// The sender flips the phase of its share if it sends a `1`; then every node changes basis, measures,
/// and broadcasts the measured bit. The outcome is the parity of the bits of all nodes.
/// For a GHZ state the broadcast bits are uniformly distributed among the strings of that parity,
/// whoever flipped the phase, which is what keeps the sender anonymous.
#[derive(Debug, Clone)]
pub struct BitRound<Id> {
    id: RoundId,
    intended: Option<bool>,
    corrected: bool,
    peers: Vec<Id>,
    state: RoundState,
    own_bit: Option<bool>,
    received: BTreeMap<Id, bool>,
}

/// What happened in a completed bit round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord<Id: Ord> {
    /// The round.
    pub round: RoundId,
    /// Whether the outcome was one vote of a repetition code.
    pub corrected: bool,
    /// The bit this node broadcast.
    pub own: bool,
    /// The bits the peers broadcast.
    pub received: BTreeMap<Id, bool>,
    /// The parity of all the bits.
    pub outcome: bool,
}

impl<Id: PartyId> BitRound<Id> {
    /// Creates the round described by `descriptor` between this node and `peers`.
    pub fn new(descriptor: &RoundDescriptor, peers: &[Id]) -> Self {
        Self {
            id: descriptor.id,
            intended: descriptor.intended,
            corrected: descriptor.corrected,
            peers: peers.to_vec(),
            state: RoundState::AwaitSharedState,
            own_bit: None,
            received: BTreeMap::new(),
        }
    }

    /// The round identifier.
    pub fn id(&self) -> RoundId {
        self.id
    }

    /// The current stage.
    pub fn state(&self) -> RoundState {
        self.state
    }

    fn expect_state(&self, expected: RoundState, action: &str) -> Result<(), LocalError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LocalError::new(format!(
                "{}: cannot {action} in state {:?}",
                self.id, self.state
            )))
        }
    }

    /// Applies the local operations to this node's share of the round's shared state.
    ///
    /// Only a sender of `1` flips the phase; everyone changes basis.
    pub fn apply_local_operations(&mut self, qubit: &mut impl LocalQubit) -> Result<(), LocalError> {
        self.expect_state(RoundState::AwaitSharedState, "apply local operations")?;
        if self.intended == Some(true) {
            qubit.apply_phase_flip();
        }
        qubit.apply_basis_change();
        self.state = RoundState::LocalOperationApplied;
        Ok(())
    }

    /// Measures the share, consuming it.
    pub fn record_measurement(&mut self, qubit: impl LocalQubit) -> Result<(), LocalError> {
        self.expect_state(RoundState::LocalOperationApplied, "measure")?;
        if self.own_bit.is_some() {
            return Err(LocalError::new(format!("{}: the share was already measured", self.id)));
        }
        self.own_bit = Some(qubit.measure());
        Ok(())
    }

    /// Returns the message to broadcast to every peer.
    pub fn make_broadcast(&self) -> Result<BitMessage, LocalError> {
        self.expect_state(RoundState::LocalOperationApplied, "broadcast")?;
        self.own_bit
            .map(BitMessage::new)
            .ok_or_else(|| LocalError::new(format!("{}: broadcasting before measuring", self.id)))
    }

    /// Marks the broadcast as delivered to every peer; from now on, peer messages are accepted.
    pub fn broadcast_sent(&mut self) -> Result<(), LocalError> {
        self.make_broadcast()?;
        self.state = RoundState::BroadcastSent;
        Ok(())
    }

    /// Processes the text received from `from`.
    pub fn receive_message(&mut self, from: &Id, text: &str) -> Result<(), Error<Id>> {
        if !matches!(
            self.state,
            RoundState::BroadcastSent | RoundState::AwaitingPeerMessages
        ) {
            return Err(LocalError::new(format!(
                "{}: cannot receive messages in state {:?}",
                self.id, self.state
            ))
            .into());
        }
        if !self.peers.contains(from) {
            return Err(ProtocolError::UnexpectedSender {
                round: self.id,
                from: from.clone(),
            }
            .into());
        }
        let message = BitMessage::parse(self.id, from, text)?;
        if self.received.contains_key(from) {
            return Err(ProtocolError::DuplicateMessage {
                round: self.id,
                from: from.clone(),
            }
            .into());
        }

        trace!("{}: received {} from {from:?}", self.id, message.bit());
        self.received.insert(from.clone(), message.bit());
        self.state = if self.received.len() == self.peers.len() {
            RoundState::RoundComplete
        } else {
            RoundState::AwaitingPeerMessages
        };
        Ok(())
    }

    /// The peers whose bits have not been received yet.
    pub fn missing_peers(&self) -> Vec<Id> {
        self.peers
            .iter()
            .filter(|peer| !self.received.contains_key(*peer))
            .cloned()
            .collect()
    }

    /// Returns `true` if every peer's bit has been received.
    pub fn can_finalize(&self) -> bool {
        self.state == RoundState::RoundComplete
    }

    /// Computes the outcome: the parity of this node's bit and all the received ones.
    pub fn finalize(self) -> Result<RoundRecord<Id>, LocalError> {
        self.expect_state(RoundState::RoundComplete, "finalize")?;
        let own = self
            .own_bit
            .ok_or_else(|| LocalError::new(format!("{}: finalizing before measuring", self.id)))?;
        let outcome = self.received.values().fold(own, |parity, bit| parity ^ bit);
        Ok(RoundRecord {
            round: self.id,
            corrected: self.corrected,
            own,
            received: self.received,
            outcome,
        })
    }
}
