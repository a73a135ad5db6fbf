use core::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// A round identifier.
///
/// The derived ordering is the execution order: the handshake first,
/// then bit rounds by position, and repetitions of a position in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoundId {
    /// The classical round in which the nodes compare their transmission plans.
    Handshake,
    /// A single-bit round.
    Bit {
        /// Position of the bit within the byte, starting from 0.
        position: u8,
        /// Index of the repetition of this bit, starting from 0.
        repetition: u8,
    },
}

impl Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Handshake => write!(f, "Handshake"),
            Self::Bit { position, repetition } => write!(f, "Bit {position} (repetition {repetition})"),
        }
    }
}

impl RoundId {
    /// Creates a bit round identifier.
    pub fn bit(position: u8, repetition: u8) -> Self {
        Self::Bit { position, repetition }
    }

    /// Returns the bit position if this is a bit round.
    pub fn position(&self) -> Option<u8> {
        match self {
            Self::Handshake => None,
            Self::Bit { position, .. } => Some(*position),
        }
    }
}
