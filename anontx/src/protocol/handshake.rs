use alloc::{collections::BTreeSet, format, string::String, vec::Vec};

use tracing::trace;

use super::{
    errors::{Error, LocalError, ProtocolError},
    message::PlanMessage,
    round::PartyId,
    round_id::RoundId,
};

/// The classical round in which every node announces the plan it is going to follow.
///
/// A node whose peers derived a different number of rounds would otherwise wait forever
/// for a round its peers never run; here the difference is detected before the first bit round.
#[derive(Debug, Clone)]
pub struct Handshake<Id> {
    plan: PlanMessage,
    peers: Vec<Id>,
    sent: bool,
    received: BTreeSet<Id>,
}

impl<Id: PartyId> Handshake<Id> {
    /// Creates a handshake announcing `plan` to `peers`.
    pub fn new(plan: PlanMessage, peers: &[Id]) -> Self {
        Self {
            plan,
            peers: peers.to_vec(),
            sent: false,
            received: BTreeSet::new(),
        }
    }

    /// Returns the text to broadcast to every peer.
    pub fn make_broadcast(&self) -> String {
        self.plan.to_text()
    }

    /// Marks the announcement as delivered to every peer.
    pub fn broadcast_sent(&mut self) {
        self.sent = true;
    }

    /// Checks the plan announced by `from` against this node's own.
    pub fn receive_message(&mut self, from: &Id, text: &str) -> Result<(), Error<Id>> {
        if !self.sent {
            return Err(LocalError::new("Handshake: cannot receive messages before broadcasting").into());
        }
        if !self.peers.contains(from) {
            return Err(ProtocolError::UnexpectedSender {
                round: RoundId::Handshake,
                from: from.clone(),
            }
            .into());
        }
        if self.received.contains(from) {
            return Err(ProtocolError::DuplicateMessage {
                round: RoundId::Handshake,
                from: from.clone(),
            }
            .into());
        }

        let remote = PlanMessage::parse(from, text)?;
        if remote != self.plan {
            return Err(ProtocolError::PlanMismatch {
                from: from.clone(),
                local: self.plan.to_text(),
                remote: remote.to_text(),
            }
            .into());
        }

        trace!("Handshake: {from:?} follows the same plan");
        self.received.insert(from.clone());
        Ok(())
    }

    /// The peers whose plans have not been received yet.
    pub fn missing_peers(&self) -> Vec<Id> {
        self.peers
            .iter()
            .filter(|peer| !self.received.contains(*peer))
            .cloned()
            .collect()
    }

    /// Returns `true` if every peer announced the same plan.
    pub fn can_finalize(&self) -> bool {
        self.sent && self.received.len() == self.peers.len()
    }

    /// Completes the handshake, returning the agreed plan.
    pub fn finalize(self) -> Result<PlanMessage, LocalError> {
        if !self.can_finalize() {
            return Err(LocalError::new(format!(
                "Handshake: cannot finalize, still missing {:?}",
                self.missing_peers()
            )));
        }
        Ok(self.plan)
    }
}
