use alloc::{string::String, vec::Vec};
use core::fmt::Debug;

use super::round_id::RoundId;

/// An error indicating a local problem, most likely a misuse of the API or a bug in the code.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
#[displaydoc("Local error: {0}")]
pub struct LocalError(String);

impl LocalError {
    /// Creates a new error from anything castable to string.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An error indicating that a node cannot take part in a transmission with the configuration it was given.
///
/// Raised at construction, before any round is executed.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
#[displaydoc("Configuration error: {0}")]
pub struct ConfigurationError(String);

impl ConfigurationError {
    /// Creates a new error from anything castable to string.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An error indicating that the payload supplied to the sender is not a byte.
///
/// Raised at construction, so nothing is transmitted.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
#[displaydoc("Validation error: {0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub(crate) fn invalid_byte() -> Self {
        Self("Input must be an 8-bit binary number".into())
    }

    /// Returns the human-readable reason.
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// An error caused by a peer sending something the protocol does not allow.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError<Id: Debug> {
    /// The received text is not a valid message for the round.
    #[displaydoc("Protocol error: {from:?} sent {text:?} in {round}, which is not a valid message")]
    MalformedMessage {
        /// The round the message was received in.
        round: RoundId,
        /// The sender.
        from: Id,
        /// The text as received.
        text: String,
    },
    /// A peer follows a different transmission plan (a different number of rounds).
    #[displaydoc("Protocol error: {from:?} follows the plan {remote}, while this node follows {local}")]
    PlanMismatch {
        /// The peer.
        from: Id,
        /// The plan of this node.
        local: String,
        /// The plan announced by the peer.
        remote: String,
    },
    /// A peer sent more than one message within a round.
    #[displaydoc("Protocol error: {from:?} sent more than one message in {round}")]
    DuplicateMessage {
        /// The round.
        round: RoundId,
        /// The sender.
        from: Id,
    },
    /// A message arrived from a node that is not a peer of this one.
    #[displaydoc("Protocol error: {from:?} is not a peer, but sent a message in {round}")]
    UnexpectedSender {
        /// The round.
        round: RoundId,
        /// The sender.
        from: Id,
    },
}

/// An error indicating that a round did not complete before its deadline.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
#[displaydoc("Timeout: {round} did not complete, no messages from {missing:?}")]
pub struct TimeoutError<Id: Debug> {
    /// The round that timed out.
    pub round: RoundId,
    /// The peers whose messages were still missing.
    pub missing: Vec<Id>,
}

/// Any error that terminates a node's run.
#[derive(displaydoc::Display, Debug, Clone, PartialEq, Eq)]
pub enum Error<Id: Debug> {
    /// See [`ConfigurationError`].
    #[displaydoc("{0}")]
    Configuration(ConfigurationError),
    /// See [`ValidationError`].
    #[displaydoc("{0}")]
    Validation(ValidationError),
    /// See [`ProtocolError`].
    #[displaydoc("{0}")]
    Protocol(ProtocolError<Id>),
    /// See [`TimeoutError`].
    #[displaydoc("{0}")]
    Timeout(TimeoutError<Id>),
    /// See [`LocalError`].
    #[displaydoc("{0}")]
    Local(LocalError),
    /// The run was cancelled by the caller.
    #[displaydoc("Terminated by the user")]
    Terminated,
}

impl<Id: Debug> From<ConfigurationError> for Error<Id> {
    fn from(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }
}

impl<Id: Debug> From<ValidationError> for Error<Id> {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error)
    }
}

impl<Id: Debug> From<ProtocolError<Id>> for Error<Id> {
    fn from(error: ProtocolError<Id>) -> Self {
        Self::Protocol(error)
    }
}

impl<Id: Debug> From<TimeoutError<Id>> for Error<Id> {
    fn from(error: TimeoutError<Id>) -> Self {
        Self::Timeout(error)
    }
}

impl<Id: Debug> From<LocalError> for Error<Id> {
    fn from(error: LocalError) -> Self {
        Self::Local(error)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::{Error, ProtocolError, TimeoutError};
    use crate::protocol::RoundId;

    #[test]
    fn display() {
        let error: Error<char> = ProtocolError::MalformedMessage {
            round: RoundId::bit(2, 0),
            from: 'D',
            text: "x".into(),
        }
        .into();
        assert_eq!(
            error.to_string(),
            r#"Protocol error: 'D' sent "x" in Bit 2 (repetition 0), which is not a valid message"#
        );

        let error: Error<char> = TimeoutError {
            round: RoundId::Handshake,
            missing: vec!['D'],
        }
        .into();
        assert_eq!(
            error.to_string(),
            "Timeout: Handshake did not complete, no messages from ['D']"
        );

        assert_eq!(Error::<char>::Terminated.to_string(), "Terminated by the user");
    }
}
