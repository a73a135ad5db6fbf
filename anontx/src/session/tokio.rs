//! High-level API for executing a transmission in a `tokio` task.

use core::{fmt::Debug, future::Future};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    program::{AnonymousTransmission, RunResult},
    session::RoundOutcome,
    transport::{ClassicalChannel, SharedStateProvider},
};
use crate::protocol::{Error, LocalError, PartyId, TimeoutError};

/// Waits for `future`, unless the round deadline passes or the run is cancelled first.
async fn guarded<T, Id: Debug>(
    future: impl Future<Output = Result<T, LocalError>>,
    deadline: Option<Instant>,
    cancellation: &CancellationToken,
    on_timeout: impl FnOnce() -> TimeoutError<Id>,
) -> Result<T, Error<Id>> {
    let expired = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => core::future::pending().await,
        }
    };

    tokio::select! {
        result = future => Ok(result?),
        _ = expired => Err(on_timeout().into()),
        _ = cancellation.cancelled() => Err(Error::Terminated),
    }
}

/// Executes the transmission of `program`, taking the shared states from `provider`
/// and talking to the peers through `channel`.
///
/// Every round waits for the shared state, then sends this node's message to every peer,
/// then receives one message from every peer, all in the order of the peer list.
/// If [`ProtocolParams::round_timeout`](`crate::protocol::ProtocolParams::round_timeout`) is set,
/// a round that does not complete in time fails with [`TimeoutError`].
pub async fn run_session<Id, P, C>(
    program: AnonymousTransmission<Id>,
    provider: &mut P,
    channel: &mut C,
    cancellation: CancellationToken,
) -> Result<RunResult<Id>, Error<Id>>
where
    Id: PartyId,
    P: SharedStateProvider,
    C: ClassicalChannel<Id>,
{
    let id = program.id().clone();
    let result = execute(program, provider, channel, &cancellation).await;
    match &result {
        Ok(result) => info!("{id:?}: received {} in {:?}", result.received_byte, result.elapsed),
        Err(Error::Terminated) => warn!("{id:?}: terminated by the user"),
        Err(error) => warn!("{id:?}: {error}"),
    }
    result
}

async fn execute<Id, P, C>(
    program: AnonymousTransmission<Id>,
    provider: &mut P,
    channel: &mut C,
    cancellation: &CancellationToken,
) -> Result<RunResult<Id>, Error<Id>>
where
    Id: PartyId,
    P: SharedStateProvider,
    C: ClassicalChannel<Id>,
{
    let id = program.id().clone();
    let round_timeout = program.params().round_timeout;
    debug!(
        "{id:?}: sharing states with {:?}",
        program.topology().entanglement_neighbours()
    );
    let start = Instant::now();
    let mut session = program.into_session();

    loop {
        debug!("{id:?}: *** starting {} ***", session.round_id());
        let deadline = round_timeout.map(|timeout| Instant::now() + timeout);

        if session.needs_shared_state() {
            let (mut qubit, metadata) = guarded(provider.establish(session.round_id()), deadline, cancellation, || {
                session.timeout_error()
            })
            .await?;
            session.apply_local_operations(&mut qubit, &metadata)?;
            guarded(provider.flush(), deadline, cancellation, || session.timeout_error()).await?;
            session.record_measurement(qubit)?;
            guarded(provider.flush(), deadline, cancellation, || session.timeout_error()).await?;
        }

        let text = session.make_broadcast()?;
        for peer in session.peers() {
            debug!("{id:?}: sending {text:?} to {peer:?}");
            guarded(channel.send(peer, text.clone()), deadline, cancellation, || {
                session.timeout_error()
            })
            .await?;
        }
        session.broadcast_sent()?;

        let peers = session.peers().to_vec();
        for peer in &peers {
            let text = guarded(channel.receive(peer), deadline, cancellation, || session.timeout_error()).await?;
            session.receive_message(peer, &text)?;
        }

        if !session.can_finalize() {
            return Err(LocalError::new("All peers responded, but the round cannot be finalized").into());
        }

        debug!("{id:?}: finalizing {}", session.round_id());
        match session.finalize_round()? {
            RoundOutcome::Finished(report) => return Ok(RunResult::new(id, start.elapsed(), report)),
            RoundOutcome::AnotherRound { session: new_session } => session = new_session,
        }
    }
}
