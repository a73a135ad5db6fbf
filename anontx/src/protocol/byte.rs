use alloc::{format, string::String, vec::Vec};
use core::{
    fmt::{self, Debug, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use super::errors::{LocalError, ValidationError};

/// The number of bit positions in a transmission.
pub const BITS_PER_BYTE: u8 = 8;

/// Eight bits, in transmission order.
///
/// Parsed from and displayed as an 8-character string of `'0'`s and `'1'`s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Byte([bool; BITS_PER_BYTE as usize]);

impl Byte {
    /// Creates a byte from its bits in transmission order.
    pub fn from_bits(bits: [bool; BITS_PER_BYTE as usize]) -> Self {
        Self(bits)
    }

    /// Returns the bits in transmission order.
    pub fn bits(&self) -> [bool; BITS_PER_BYTE as usize] {
        self.0
    }

    /// Returns the bit at `position`, if it is within the byte.
    pub fn bit(&self, position: u8) -> Option<bool> {
        self.0.get(usize::from(position)).copied()
    }

    /// The number of positions in which `self` and `other` differ.
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        let mut distance = 0;
        for (lhs, rhs) in self.0.iter().zip(other.0.iter()) {
            if lhs != rhs {
                distance += 1;
            }
        }
        distance
    }
}

impl From<u8> for Byte {
    /// Most significant bit first.
    fn from(value: u8) -> Self {
        let mut bits = [false; BITS_PER_BYTE as usize];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = value & (0x80 >> i) != 0;
        }
        Self(bits)
    }
}

impl From<Byte> for u8 {
    fn from(byte: Byte) -> Self {
        byte.0.iter().fold(0, |acc, bit| (acc << 1) | u8::from(*bit))
    }
}

impl FromStr for Byte {
    type Err = ValidationError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut bits = [false; BITS_PER_BYTE as usize];
        let mut chars = source.chars();
        for bit in bits.iter_mut() {
            *bit = match chars.next() {
                Some('0') => false,
                Some('1') => true,
                _ => return Err(ValidationError::invalid_byte()),
            };
        }
        if chars.next().is_some() {
            return Err(ValidationError::invalid_byte());
        }
        Ok(Self(bits))
    }
}

impl TryFrom<String> for Byte {
    type Error = ValidationError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        source.parse()
    }
}

impl From<Byte> for String {
    fn from(byte: Byte) -> Self {
        format!("{byte}")
    }
}

impl Display for Byte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0 {
            write!(f, "{}", u8::from(bit))?;
        }
        Ok(())
    }
}

impl Debug for Byte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Byte({self})")
    }
}

/// Collects the decided bits of a transmission, position by position.
#[derive(Debug, Clone, Default)]
pub struct ByteAssembler {
    bits: Vec<bool>,
}

impl ByteAssembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the decided bit for `position`.
    ///
    /// Positions must arrive in order.
    pub fn push(&mut self, position: u8, bit: bool) -> Result<(), LocalError> {
        if usize::from(position) != self.bits.len() || position >= BITS_PER_BYTE {
            return Err(LocalError::new(format!(
                "Expected the bit for position {}, got position {position}",
                self.bits.len()
            )));
        }
        self.bits.push(bit);
        Ok(())
    }

    /// Returns the assembled byte once all positions are decided.
    pub fn finish(self) -> Result<Byte, LocalError> {
        let bits: [bool; BITS_PER_BYTE as usize] = self
            .bits
            .try_into()
            .map_err(|bits: Vec<bool>| LocalError::new(format!("Only {} bits were decided", bits.len())))?;
        Ok(Byte(bits))
    }
}
