use alloc::{format, vec::Vec};

use serde::{Deserialize, Serialize};

use crate::protocol::{LocalError, PartyId, RoundId, RoundRecord};

/// A node's local view of a transmission: every bit it broadcast and received, round by round.
///
/// This is all a node learns during a run, so the anonymity of the sender is a property of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive_where::derive_where(Default)]
pub struct Transcript<Id: Ord> {
    rounds: Vec<RoundRecord<Id>>,
}

impl<Id: PartyId> Transcript<Id> {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the record of a completed round.
    ///
    /// Rounds must be recorded in execution order, each at most once.
    pub fn push(&mut self, record: RoundRecord<Id>) -> Result<(), LocalError> {
        if let Some(last) = self.rounds.last() {
            if last.round >= record.round {
                return Err(LocalError::new(format!(
                    "{} cannot be recorded after {}",
                    record.round, last.round
                )));
            }
        }
        self.rounds.push(record);
        Ok(())
    }

    /// Returns the record of `round`, if it was completed.
    pub fn get(&self, round: &RoundId) -> Option<&RoundRecord<Id>> {
        self.rounds
            .binary_search_by(|record| record.round.cmp(round))
            .ok()
            .and_then(|index| self.rounds.get(index))
    }

    /// The completed rounds in execution order.
    pub fn rounds(&self) -> &[RoundRecord<Id>] {
        &self.rounds
    }

    /// The outcome of every completed round, in execution order.
    pub fn outcomes(&self) -> impl Iterator<Item = (RoundId, bool)> + '_ {
        self.rounds.iter().map(|record| (record.round, record.outcome))
    }

    /// The bits `peer` broadcast, in execution order.
    pub fn broadcasts_from<'a>(&'a self, peer: &'a Id) -> impl Iterator<Item = (RoundId, bool)> + 'a {
        self.rounds
            .iter()
            .filter_map(move |record| record.received.get(peer).map(|bit| (record.round, *bit)))
    }
}
