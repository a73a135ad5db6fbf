use alloc::{collections::BTreeMap, format, string::String, vec::Vec};
use core::fmt::Debug;

use rand::Rng;
use rand_core::CryptoRngCore;
use tracing::{debug, trace, warn};

use super::ghz::GhzSampler;
use crate::{
    protocol::{Byte, Error, LocalError, PartyId, RoundId},
    session::{AnonymousTransmission, RoundOutcome, RunResult, Session},
};

struct RoundMessage<Id> {
    from: Id,
    to: Id,
    text: String,
}

/// The results of executing a transmission on every node.
#[derive(Debug)]
pub struct ExecutionResult<Id: Ord + Debug> {
    /// The result of every node's run.
    pub results: BTreeMap<Id, Result<RunResult<Id>, Error<Id>>>,
}

impl<Id: PartyId> ExecutionResult<Id> {
    /// Returns the received bytes if every node finished successfully,
    /// otherwise a description of the first failure.
    pub fn received_bytes(&self) -> Result<BTreeMap<Id, Byte>, String> {
        self.results
            .iter()
            .map(|(id, result)| match result {
                Ok(result) => Ok((id.clone(), result.received_byte)),
                Err(error) => Err(format!("{id:?}: {error}")),
            })
            .collect()
    }

    /// Returns the error every failed node ended up with.
    pub fn errors(&self) -> BTreeMap<Id, Error<Id>> {
        self.results
            .iter()
            .filter_map(|(id, result)| result.as_ref().err().map(|error| (id.clone(), error.clone())))
            .collect()
    }
}

fn fail<Id: PartyId>(
    results: &mut BTreeMap<Id, Result<RunResult<Id>, Error<Id>>>,
    id: &Id,
    error: impl Into<Error<Id>>,
) {
    let error = error.into();
    warn!("{id:?}: {error}");
    results.insert(id.clone(), Err(error));
}

/// Executes the programs of all nodes of a network in a single thread, in lock-step:
/// in every round, all nodes get their shares of a state sampled by `sampler`,
/// then all broadcasts are made and delivered in random order, then all nodes finalize the round.
///
/// A node that cannot finalize a round because some peer has stopped fails with a
/// [`TimeoutError`](`crate::protocol::TimeoutError`). The elapsed time of a run
/// is the total generation time reported by the sampler.
pub fn run_sync<Id, R>(
    rng: &mut impl CryptoRngCore,
    sampler: &mut GhzSampler<R>,
    programs: Vec<AnonymousTransmission<Id>>,
) -> Result<ExecutionResult<Id>, LocalError>
where
    Id: PartyId,
    R: CryptoRngCore,
{
    let mut sessions = BTreeMap::new();
    for program in programs {
        let id = program.id().clone();
        if sessions.insert(id.clone(), program.into_session()).is_some() {
            return Err(LocalError::new(format!("Two programs were given for {id:?}")));
        }
    }

    let mut results = BTreeMap::new();

    while !sessions.is_empty() {
        establish_shared_states(sampler, &mut sessions, &mut results);

        let mut messages = Vec::new();
        for (id, session) in sessions.iter_mut() {
            let text = match session.make_broadcast() {
                Ok(text) => text,
                Err(error) => {
                    fail(&mut results, id, error);
                    continue;
                }
            };
            for peer in session.peers() {
                messages.push(RoundMessage {
                    from: id.clone(),
                    to: peer.clone(),
                    text: text.clone(),
                });
            }
            if let Err(error) = session.broadcast_sent() {
                fail(&mut results, id, error);
            }
        }
        sessions.retain(|id, _| !results.contains_key(id));

        let messages_len = messages.len();
        while !messages.is_empty() {
            // Pick a random message and deliver it
            let message = messages.swap_remove(rng.gen_range(0..messages.len()));
            trace!(
                "Delivering message from {:?} to {:?} ({}/{messages_len})",
                message.from,
                message.to,
                messages_len - messages.len(),
            );
            let session = match sessions.get_mut(&message.to) {
                Some(session) => session,
                None => {
                    trace!("{:?} has stopped, dropping the message", message.to);
                    continue;
                }
            };
            if let Err(error) = session.receive_message(&message.from, &message.text) {
                fail(&mut results, &message.to, error);
                sessions.remove(&message.to);
            }
        }

        let round_sessions = core::mem::take(&mut sessions);
        for (id, session) in round_sessions {
            if !session.can_finalize() {
                fail(&mut results, &id, session.timeout_error());
                continue;
            }
            debug!("{id:?}: finalizing {}", session.round_id());
            match session.finalize_round() {
                Ok(RoundOutcome::Finished(report)) => {
                    let elapsed = report.generation_time;
                    results.insert(id.clone(), Ok(RunResult::new(id, elapsed, report)));
                }
                Ok(RoundOutcome::AnotherRound { session }) => {
                    sessions.insert(id, session);
                }
                Err(error) => fail(&mut results, &id, error),
            }
        }
    }

    Ok(ExecutionResult { results })
}

fn establish_shared_states<Id, R>(
    sampler: &mut GhzSampler<R>,
    sessions: &mut BTreeMap<Id, Session<Id>>,
    results: &mut BTreeMap<Id, Result<RunResult<Id>, Error<Id>>>,
) where
    Id: PartyId,
    R: CryptoRngCore,
{
    let mut rounds = BTreeMap::<RoundId, Vec<Id>>::new();
    for (id, session) in sessions.iter() {
        if session.needs_shared_state() {
            rounds.entry(session.round_id()).or_default().push(id.clone());
        }
    }

    for (round, ids) in rounds {
        debug!("Establishing the state of {round} among {} nodes", ids.len());
        let shares = sampler.sample(round, ids.len());
        let metadata = sampler.metadata();
        for (id, mut share) in ids.into_iter().zip(shares) {
            let Some(session) = sessions.get_mut(&id) else {
                continue;
            };
            let result = session
                .apply_local_operations(&mut share, &metadata)
                .and_then(|()| session.record_measurement(share));
            if let Err(error) = result {
                fail(results, &id, error);
                sessions.remove(&id);
            }
        }
    }
}
