use alloc::{collections::BTreeSet, format, vec::Vec};

use serde::{Deserialize, Serialize};

use super::{errors::ConfigurationError, round::PartyId};

/// The position of a node on the line, and the nodes it talks to.
///
/// The shared state is established along the line, so a node only needs its immediate neighbours for that;
/// the classical broadcast goes to every other participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology<Id> {
    id: Id,
    position: usize,
    participants: Vec<Id>,
    peers: Vec<Id>,
}

impl<Id: PartyId> Topology<Id> {
    /// Resolves the place of `id` within the ordered list of `participants`.
    ///
    /// Fails if `id` is not in the list, if the list contains duplicates,
    /// or if there is nobody to transmit to.
    pub fn resolve(id: Id, participants: &[Id]) -> Result<Self, ConfigurationError> {
        if participants.len() < 2 {
            return Err(ConfigurationError::new(format!(
                "At least two participants are required, got {participants:?}"
            )));
        }

        let unique = participants.iter().collect::<BTreeSet<_>>();
        if unique.len() != participants.len() {
            return Err(ConfigurationError::new(format!(
                "The participant list {participants:?} contains duplicates"
            )));
        }

        let position = participants
            .iter()
            .position(|participant| participant == &id)
            .ok_or_else(|| ConfigurationError::new(format!("{id:?} is not in the participant list {participants:?}")))?;

        let peers = participants
            .iter()
            .filter(|participant| *participant != &id)
            .cloned()
            .collect();

        Ok(Self {
            id,
            position,
            participants: participants.to_vec(),
            peers,
        })
    }

    /// This node's identity.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// This node's index on the line.
    pub fn position(&self) -> usize {
        self.position
    }

    /// All participants, in line order.
    pub fn participants(&self) -> &[Id] {
        &self.participants
    }

    /// The next node on the line, if this one is not the last.
    pub fn next(&self) -> Option<&Id> {
        self.participants.get(self.position + 1)
    }

    /// The previous node on the line, if this one is not the first.
    pub fn prev(&self) -> Option<&Id> {
        self.position
            .checked_sub(1)
            .and_then(|position| self.participants.get(position))
    }

    /// Every participant except this one, in line order.
    ///
    /// Broadcasts go out, and are received, in this order.
    pub fn peers(&self) -> &[Id] {
        &self.peers
    }

    /// The neighbours the shared state is established with: `prev` and `next`, whichever exist.
    pub fn entanglement_neighbours(&self) -> Vec<&Id> {
        self.prev().into_iter().chain(self.next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};

    use super::Topology;

    fn line() -> Vec<char> {
        vec!['A', 'B', 'C', 'D']
    }

    #[test]
    fn ends_of_the_line() {
        let a = Topology::resolve('A', &line()).unwrap();
        assert_eq!(a.next(), Some(&'B'));
        assert_eq!(a.prev(), None);
        assert_eq!(a.entanglement_neighbours(), vec![&'B']);

        let d = Topology::resolve('D', &line()).unwrap();
        assert_eq!(d.next(), None);
        assert_eq!(d.prev(), Some(&'C'));
    }

    #[test]
    fn peers_keep_the_configured_order() {
        let b = Topology::resolve('B', &line()).unwrap();
        assert_eq!(b.position(), 1);
        assert_eq!(b.peers(), &['A', 'C', 'D']);
        assert_eq!(b.entanglement_neighbours(), vec![&'A', &'C']);
    }

    #[test]
    fn rejects_bad_participant_lists() {
        assert!(Topology::resolve('E', &line()).is_err());
        assert!(Topology::resolve('A', &['A', 'B', 'A']).is_err());
        assert!(Topology::resolve('A', &['A']).is_err());
    }
}
