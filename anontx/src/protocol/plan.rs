use alloc::format;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    byte::{Byte, BITS_PER_BYTE},
    errors::ConfigurationError,
    message::PlanMessage,
    round_id::RoundId,
};

/// The number of times every bit is transmitted.
///
/// Always odd, so that a majority vote over the outcomes can never tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Repetitions(u8);

impl Repetitions {
    /// No correction: one round per bit.
    pub const SINGLE: Self = Self(1);

    /// The default repetition code: three rounds per bit.
    pub const TRIPLE: Self = Self(3);

    /// Creates a repetition count, which must be odd.
    pub fn new(count: u8) -> Result<Self, ConfigurationError> {
        if count % 2 == 1 {
            Ok(Self(count))
        } else {
            Err(ConfigurationError::new(format!(
                "The number of repetitions must be odd, got {count}"
            )))
        }
    }

    /// Returns the count.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Repetitions {
    fn default() -> Self {
        Self::TRIPLE
    }
}

impl TryFrom<u8> for Repetitions {
    type Error = ConfigurationError;

    fn try_from(count: u8) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<Repetitions> for u8 {
    fn from(repetitions: Repetitions) -> Self {
        repetitions.0
    }
}

/// Parameters every participant of a transmission must agree on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// The repetitions per bit used when correction is requested.
    pub corrected_repetitions: Repetitions,
    /// The deadline for every round, if any.
    ///
    /// Without one, a peer that never responds stalls the run indefinitely.
    pub round_timeout: Option<Duration>,
}

/// What one round of a transmission is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundDescriptor {
    /// The round.
    pub id: RoundId,
    /// The bit to encode, for the sender; `None` for receivers.
    pub intended: Option<bool>,
    /// Whether the round is one of several repetitions of the same bit.
    pub corrected: bool,
}

/// The sequence of bit rounds a node runs to send or receive one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionPlan {
    payload: Option<Byte>,
    repetitions: Repetitions,
    corrected: bool,
}

impl TransmissionPlan {
    /// Creates the plan for a sender (`payload` is `Some`) or a receiver.
    pub fn new(payload: Option<Byte>, correction: bool, params: &ProtocolParams) -> Self {
        let repetitions = if correction {
            params.corrected_repetitions
        } else {
            Repetitions::SINGLE
        };
        Self {
            payload,
            repetitions,
            corrected: correction,
        }
    }

    /// The repetitions per bit.
    pub fn repetitions(&self) -> Repetitions {
        self.repetitions
    }

    /// The total number of bit rounds.
    pub fn total_rounds(&self) -> usize {
        usize::from(BITS_PER_BYTE) * usize::from(self.repetitions.get())
    }

    /// The summary announced to the peers during the handshake.
    pub fn announcement(&self) -> PlanMessage {
        PlanMessage {
            bits: BITS_PER_BYTE,
            repetitions: self.repetitions.get(),
        }
    }

    /// Enumerates the bit rounds in execution order.
    pub fn rounds(&self) -> Rounds {
        Rounds { plan: *self, next: 0 }
    }
}

/// An iterator over the [`RoundDescriptor`]s of a [`TransmissionPlan`].
#[derive(Debug, Clone)]
pub struct Rounds {
    plan: TransmissionPlan,
    next: usize,
}

impl Iterator for Rounds {
    type Item = RoundDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.plan.total_rounds() {
            return None;
        }
        let repetitions = usize::from(self.plan.repetitions.get());
        let position = u8::try_from(self.next / repetitions).ok()?;
        let repetition = u8::try_from(self.next % repetitions).ok()?;
        self.next += 1;

        let intended = match &self.plan.payload {
            Some(byte) => Some(byte.bit(position)?),
            None => None,
        };
        Some(RoundDescriptor {
            id: RoundId::bit(position, repetition),
            intended,
            corrected: self.plan.corrected,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.total_rounds().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rounds {}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{ProtocolParams, Repetitions, TransmissionPlan};
    use crate::protocol::{Byte, RoundId};

    #[test]
    fn repetitions_must_be_odd() {
        assert!(Repetitions::new(0).is_err());
        assert!(Repetitions::new(4).is_err());
        assert_eq!(Repetitions::new(5).unwrap().get(), 5);
        assert!(serde_json::from_str::<Repetitions>("2").is_err());
    }

    #[test]
    fn sender_rounds_carry_the_payload_bits() {
        let byte = "10110000".parse::<Byte>().unwrap();
        let plan = TransmissionPlan::new(Some(byte), false, &ProtocolParams::default());
        let rounds = plan.rounds().collect::<Vec<_>>();
        assert_eq!(rounds.len(), 8);
        let intended = rounds.iter().map(|round| round.intended).collect::<Vec<_>>();
        let expected = byte.bits().map(Some);
        assert_eq!(intended, expected);
        assert!(rounds.iter().all(|round| !round.corrected));
    }

    #[test]
    fn corrected_plan_repeats_every_bit() {
        let params = ProtocolParams {
            corrected_repetitions: Repetitions::new(5).unwrap(),
            round_timeout: None,
        };
        let plan = TransmissionPlan::new(None, true, &params);
        assert_eq!(plan.total_rounds(), 40);
        assert_eq!(plan.announcement().repetitions, 5);

        let rounds = plan.rounds();
        assert_eq!(rounds.len(), 40);
        let ids = rounds.map(|round| round.id).collect::<Vec<_>>();
        assert_eq!(ids.first(), Some(&RoundId::bit(0, 0)));
        assert_eq!(ids.get(6), Some(&RoundId::bit(1, 1)));
        assert_eq!(ids.last(), Some(&RoundId::bit(7, 4)));
    }

    #[test]
    fn receivers_have_no_intended_bits() {
        let plan = TransmissionPlan::new(None, true, &ProtocolParams::default());
        assert_eq!(plan.total_rounds(), 24);
        assert!(plan.rounds().all(|round| round.intended.is_none() && round.corrected));
    }
}
