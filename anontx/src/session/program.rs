use core::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    session::{Session, SessionReport},
    transcript::Transcript,
};
use crate::protocol::{Byte, Error, PartyId, ProtocolParams, Topology, TransmissionPlan};

/// One node's part in the anonymous transmission of a byte.
///
/// The sender is the node constructed with a payload; every other node receives.
/// All participants must be constructed with the same participant list, correction flag and parameters.
#[derive(Debug, Clone)]
pub struct AnonymousTransmission<Id> {
    topology: Topology<Id>,
    payload: Option<Byte>,
    correction: bool,
    params: ProtocolParams,
}

impl<Id: PartyId> AnonymousTransmission<Id> {
    /// Creates the program for the node `id` in the line `participants`.
    ///
    /// `payload` is an 8-character string of `'0'`s and `'1'`s for the sender, `None` for receivers.
    /// `correction` enables the repetition code and defaults to off.
    pub fn new(id: Id, participants: &[Id], payload: Option<&str>, correction: Option<bool>) -> Result<Self, Error<Id>> {
        let topology = Topology::resolve(id, participants)?;
        let payload = payload.map(str::parse::<Byte>).transpose()?;
        Ok(Self {
            topology,
            payload,
            correction: correction.unwrap_or(false),
            params: ProtocolParams::default(),
        })
    }

    /// Overrides the protocol parameters.
    pub fn with_params(self, params: ProtocolParams) -> Self {
        Self { params, ..self }
    }

    /// This node's identity.
    pub fn id(&self) -> &Id {
        self.topology.id()
    }

    /// This node's place in the network.
    pub fn topology(&self) -> &Topology<Id> {
        &self.topology
    }

    /// The protocol parameters.
    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Returns `true` if this node sends the byte.
    pub fn is_sender(&self) -> bool {
        self.payload.is_some()
    }

    /// The rounds this node is going to run.
    pub fn plan(&self) -> TransmissionPlan {
        TransmissionPlan::new(self.payload, self.correction, &self.params)
    }

    /// Starts the session.
    pub fn into_session(self) -> Session<Id> {
        let plan = self.plan();
        debug!(
            "{:?}: starting a transmission of {} rounds ({})",
            self.topology.id(),
            plan.total_rounds(),
            if self.is_sender() { "sender" } else { "receiver" }
        );
        Session::new(self.topology, &plan)
    }
}

/// The result of one node's run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult<Id: Ord> {
    /// The node.
    pub id: Id,
    /// The time the run took.
    pub elapsed: Duration,
    /// The byte this node ended up with.
    pub received_byte: Byte,
    /// Everything this node broadcast and received.
    pub transcript: Transcript<Id>,
}

impl<Id: PartyId> RunResult<Id> {
    /// Attributes the report of a finished [`Session`] to the node `id`.
    ///
    /// `elapsed` is whatever time the driver measured for the run.
    pub fn new(id: Id, elapsed: Duration, report: SessionReport<Id>) -> Self {
        Self {
            id,
            elapsed,
            received_byte: report.byte,
            transcript: report.transcript,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec::Vec};
    use core::time::Duration;

    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;

    use super::{AnonymousTransmission, RunResult};
    use crate::{
        dev::GhzSampler,
        protocol::{Error, ProtocolParams, Repetitions},
        session::RoundOutcome,
    };

    const LINE: [char; 4] = ['A', 'B', 'C', 'D'];

    #[test]
    fn invalid_payloads_fail_at_construction() {
        for payload in ["123", "1021000", "1021000a"] {
            let error = AnonymousTransmission::new('B', &LINE, Some(payload), Some(true)).unwrap_err();
            match error {
                Error::Validation(error) => assert_eq!(error.message(), "Input must be an 8-bit binary number"),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn unknown_node_fails_at_construction() {
        assert!(matches!(
            AnonymousTransmission::new('E', &LINE, None, None),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn plan_follows_the_correction_flag() {
        let receiver = AnonymousTransmission::new('A', &LINE, None, None).unwrap();
        assert!(!receiver.is_sender());
        assert_eq!(receiver.plan().total_rounds(), 8);

        let sender = AnonymousTransmission::new('B', &LINE, Some("11111111"), Some(true))
            .unwrap()
            .with_params(ProtocolParams {
                corrected_repetitions: Repetitions::new(5).unwrap(),
                round_timeout: None,
            });
        assert!(sender.is_sender());
        assert_eq!(sender.plan().total_rounds(), 40);
        assert_eq!(sender.topology().peers(), &['A', 'C', 'D']);
    }

    #[test]
    fn hand_driven_sessions_produce_run_results() {
        let line = ['A', 'B', 'C'];
        let mut sampler = GhzSampler::new(ChaCha8Rng::seed_from_u64(1)).with_generation_time(Duration::from_millis(2));
        let mut sessions = line
            .iter()
            .map(|id| {
                let payload = (*id == 'C').then_some("01000001");
                AnonymousTransmission::new(*id, &line, payload, None)
                    .unwrap()
                    .into_session()
            })
            .collect::<Vec<_>>();

        let mut results = Vec::new();
        while !sessions.is_empty() {
            if sessions.iter().all(|session| session.needs_shared_state()) {
                let round = sessions.first().unwrap().round_id();
                let shares = sampler.sample(round, sessions.len());
                for (session, mut share) in sessions.iter_mut().zip(shares) {
                    session.apply_local_operations(&mut share, &sampler.metadata()).unwrap();
                    session.record_measurement(share).unwrap();
                }
            }

            let broadcasts = sessions
                .iter()
                .map(|session| (*session.id(), session.make_broadcast().unwrap()))
                .collect::<Vec<_>>();
            for session in sessions.iter_mut() {
                session.broadcast_sent().unwrap();
                for (from, text) in broadcasts.iter() {
                    if from != session.id() {
                        session.receive_message(from, text).unwrap();
                    }
                }
            }

            let mut next = Vec::new();
            for session in sessions {
                assert!(session.can_finalize());
                let id = *session.id();
                match session.finalize_round().unwrap() {
                    RoundOutcome::Finished(report) => {
                        results.push(RunResult::new(id, report.generation_time, report));
                    }
                    RoundOutcome::AnotherRound { session } => next.push(session),
                }
            }
            sessions = next;
        }

        assert_eq!(results.len(), 3);
        for (result, id) in results.iter().zip(line) {
            assert_eq!(result.id, id);
            assert_eq!(result.received_byte.to_string(), "01000001");
            assert_eq!(result.elapsed, Duration::from_millis(16));
            assert_eq!(result.transcript.rounds().len(), 8);
        }
    }
}
