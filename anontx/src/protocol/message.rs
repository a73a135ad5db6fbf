//! Text encodings of the classical messages.
//!
//! The classical channel carries text. A bit round message is exactly `"0"` or `"1"`;
//! a handshake message is `"<bits>x<repetitions>"`, e.g. `"8x3"`.

use alloc::{format, string::String, string::ToString};
use core::fmt::Debug;

use super::{errors::ProtocolError, round_id::RoundId};

/// The measured bit a node broadcasts in a bit round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitMessage(bool);

impl BitMessage {
    /// Wraps a measured bit.
    pub fn new(bit: bool) -> Self {
        Self(bit)
    }

    /// Returns the bit.
    pub fn bit(&self) -> bool {
        self.0
    }

    /// Encodes the bit for the classical channel.
    pub fn to_text(self) -> String {
        let text = if self.0 { "1" } else { "0" };
        text.into()
    }

    /// Decodes a message received from `from` in `round`.
    ///
    /// Anything other than `"0"` or `"1"` is a [`ProtocolError::MalformedMessage`];
    /// in particular, nothing is trimmed or defaulted.
    pub fn parse<Id: Clone + Debug>(round: RoundId, from: &Id, text: &str) -> Result<Self, ProtocolError<Id>> {
        match text {
            "0" => Ok(Self(false)),
            "1" => Ok(Self(true)),
            _ => Err(ProtocolError::MalformedMessage {
                round,
                from: from.clone(),
                text: text.into(),
            }),
        }
    }
}

/// The transmission plan a node announces in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanMessage {
    /// The number of bit positions.
    pub bits: u8,
    /// The number of repetitions of every bit.
    pub repetitions: u8,
}

impl PlanMessage {
    /// Encodes the plan for the classical channel.
    pub fn to_text(self) -> String {
        format!("{}x{}", self.bits, self.repetitions)
    }

    /// Decodes a plan received from `from` during the handshake.
    ///
    /// Only the exact encoding produced by [`to_text`](`Self::to_text`) is accepted.
    pub fn parse<Id: Clone + Debug>(from: &Id, text: &str) -> Result<Self, ProtocolError<Id>> {
        let malformed = || ProtocolError::MalformedMessage {
            round: RoundId::Handshake,
            from: from.clone(),
            text: text.to_string(),
        };
        let (bits, repetitions) = text.split_once('x').ok_or_else(malformed)?;
        let plan = Self {
            bits: bits.parse().map_err(|_| malformed())?,
            repetitions: repetitions.parse().map_err(|_| malformed())?,
        };
        if plan.to_text() != text {
            return Err(malformed());
        }
        Ok(plan)
    }
}
