//! `tokio`-specific development utilities.

use alloc::{collections::BTreeMap, format, string::String, sync::Arc, vec::Vec};

use rand_core::CryptoRngCore;
use tokio::sync::{mpsc, Barrier, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::{
    ghz::{GhzSampler, SimulatedQubit},
    run_sync::ExecutionResult,
};
use crate::{
    protocol::{LocalError, PartyId, RoundId, StateMetadata},
    session::{tokio::run_session, AnonymousTransmission, ClassicalChannel, SharedStateProvider},
};

const CHANNEL_CAPACITY: usize = 100;

/// One node's end of an in-memory classical network.
#[derive(Debug)]
pub struct ClassicalEndpoint<Id> {
    id: Id,
    txs: BTreeMap<Id, mpsc::Sender<String>>,
    rxs: BTreeMap<Id, mpsc::Receiver<String>>,
}

/// Connects every pair of `participants` with a pair of ordered channels.
pub fn classical_network<Id: PartyId>(participants: &[Id]) -> BTreeMap<Id, ClassicalEndpoint<Id>> {
    let mut endpoints = participants
        .iter()
        .map(|id| {
            (
                id.clone(),
                ClassicalEndpoint {
                    id: id.clone(),
                    txs: BTreeMap::new(),
                    rxs: BTreeMap::new(),
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    for from in participants {
        for to in participants.iter().filter(|to| *to != from) {
            let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
            if let Some(endpoint) = endpoints.get_mut(from) {
                endpoint.txs.insert(to.clone(), tx);
            }
            if let Some(endpoint) = endpoints.get_mut(to) {
                endpoint.rxs.insert(from.clone(), rx);
            }
        }
    }

    endpoints
}

impl<Id: PartyId> ClassicalChannel<Id> for ClassicalEndpoint<Id> {
    async fn send(&mut self, to: &Id, text: String) -> Result<(), LocalError> {
        trace!("{:?} -> {to:?}: {text:?}", self.id);
        self.txs
            .get(to)
            .ok_or_else(|| LocalError::new(format!("{:?} has no channel to {to:?}", self.id)))?
            .send(text)
            .await
            .map_err(|err| LocalError::new(format!("Failed to send a message from {:?} to {to:?}: {err}", self.id)))
    }

    async fn receive(&mut self, from: &Id) -> Result<String, LocalError> {
        let id = &self.id;
        self.rxs
            .get_mut(from)
            .ok_or_else(|| LocalError::new(format!("{id:?} has no channel from {from:?}")))?
            .recv()
            .await
            .ok_or_else(|| LocalError::new(format!("The channel from {from:?} to {id:?} was closed")))
    }
}

#[derive(Debug)]
struct SourceState<R> {
    sampler: GhzSampler<R>,
    pending: BTreeMap<RoundId, Vec<Option<SimulatedQubit>>>,
}

/// A simulated source of GHZ states shared by the tasks of all nodes.
///
/// The state of a round is sampled once every node has asked for it,
/// and each node gets the share matching its position on the line.
#[derive(Debug)]
pub struct GhzSource<R> {
    state: Arc<Mutex<SourceState<R>>>,
    barrier: Arc<Barrier>,
    parties: usize,
}

impl<R: CryptoRngCore> GhzSource<R> {
    /// Creates a source for a line of `parties` nodes.
    pub fn new(sampler: GhzSampler<R>, parties: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(SourceState {
                sampler,
                pending: BTreeMap::new(),
            })),
            barrier: Arc::new(Barrier::new(parties)),
            parties,
        }
    }

    /// Returns the provider for the node at `position` on the line.
    pub fn provider(&self, position: usize) -> GhzProvider<R> {
        GhzProvider {
            state: self.state.clone(),
            barrier: self.barrier.clone(),
            parties: self.parties,
            position,
        }
    }
}

/// One node's access to a [`GhzSource`].
#[derive(Debug)]
pub struct GhzProvider<R> {
    state: Arc<Mutex<SourceState<R>>>,
    barrier: Arc<Barrier>,
    parties: usize,
    position: usize,
}

impl<R: CryptoRngCore + Send> SharedStateProvider for GhzProvider<R> {
    type Qubit = SimulatedQubit;

    async fn establish(&mut self, round: RoundId) -> Result<(SimulatedQubit, StateMetadata), LocalError> {
        self.barrier.wait().await;

        let (share, metadata) = {
            let mut state = self.state.lock().await;
            let SourceState { sampler, pending } = &mut *state;
            let shares = pending
                .entry(round)
                .or_insert_with(|| sampler.sample(round, self.parties).into_iter().map(Some).collect());
            let share = shares
                .get_mut(self.position)
                .and_then(Option::take)
                .ok_or_else(|| LocalError::new(format!("No share left at position {} in {round}", self.position)))?;
            if shares.iter().all(Option::is_none) {
                pending.remove(&round);
            }
            (share, sampler.metadata())
        };

        tokio::time::sleep(metadata.generation_time).await;
        Ok((share, metadata))
    }
}

/// Executes the programs of all nodes of a network concurrently within a `tokio` runtime,
/// connected by an in-memory classical network and a simulated GHZ source.
///
/// All programs must be constructed with the same participant list.
pub async fn run_async<Id, R>(
    programs: Vec<AnonymousTransmission<Id>>,
    sampler: GhzSampler<R>,
    cancellation: CancellationToken,
) -> Result<ExecutionResult<Id>, LocalError>
where
    Id: PartyId,
    R: 'static + CryptoRngCore + Send,
{
    let participants = programs
        .first()
        .map(|program| program.topology().participants().to_vec())
        .unwrap_or_default();
    let mut endpoints = classical_network(&participants);
    let source = GhzSource::new(sampler, participants.len());

    let handles = programs
        .into_iter()
        .map(|program| {
            let id = program.id().clone();
            let mut channel = endpoints
                .remove(&id)
                .ok_or_else(|| LocalError::new(format!("{id:?} is missing from the network or has two programs")))?;
            let mut provider = source.provider(program.topology().position());
            let cancellation = cancellation.clone();
            let node_task = async move { run_session(program, &mut provider, &mut channel, cancellation).await };
            Ok((id, tokio::spawn(node_task)))
        })
        .collect::<Result<Vec<_>, LocalError>>()?;

    let mut results = BTreeMap::new();
    for (id, handle) in handles {
        let result = handle
            .await
            .map_err(|err| LocalError::new(format!("Could not join the task of {id:?}: {err}")))?;
        results.insert(id, result);
    }

    Ok(ExecutionResult { results })
}
