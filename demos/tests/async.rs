use std::time::Duration;

use anontx::{
    dev::{
        tokio::{classical_network, run_async, GhzSource},
        GhzSampler,
    },
    protocol::{Byte, Error, ProtocolError, ProtocolParams, RoundId, TimeoutError},
    session::{tokio::run_session, AnonymousTransmission, ClassicalChannel, RunResult, SharedStateProvider},
};
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const LINE: [char; 4] = ['A', 'B', 'C', 'D'];

fn program(id: char, params: ProtocolParams) -> AnonymousTransmission<char> {
    let payload = (id == 'B').then_some("11111111");
    AnonymousTransmission::new(id, &LINE, payload, Some(true))
        .unwrap()
        .with_params(params)
}

/// Spawns honest nodes A, B and C, leaving D to the test.
fn spawn_honest_nodes(
    params: ProtocolParams,
    cancellation: &CancellationToken,
) -> (
    Vec<JoinHandle<Result<RunResult<char>, Error<char>>>>,
    anontx::dev::tokio::ClassicalEndpoint<char>,
    anontx::dev::tokio::GhzProvider<ChaCha8Rng>,
) {
    let mut endpoints = classical_network(&LINE);
    let source = GhzSource::new(GhzSampler::new(ChaCha8Rng::seed_from_u64(1)), LINE.len());

    let handles = LINE
        .iter()
        .take(3)
        .enumerate()
        .map(|(position, id)| {
            let mut channel = endpoints.remove(id).unwrap();
            let mut provider = source.provider(position);
            let program = program(*id, params);
            let cancellation = cancellation.clone();
            tokio::spawn(async move { run_session(program, &mut provider, &mut channel, cancellation).await })
        })
        .collect();

    (handles, endpoints.remove(&'D').unwrap(), source.provider(3))
}

#[test_log::test(tokio::test(start_paused = true))]
async fn four_nodes_with_correction() {
    let sampler = GhzSampler::new(ChaCha8Rng::seed_from_u64(2)).with_generation_time(Duration::from_millis(10));
    let programs = LINE.iter().map(|id| program(*id, ProtocolParams::default())).collect();

    let result = run_async(programs, sampler, CancellationToken::new()).await.unwrap();

    let expected = "11111111".parse::<Byte>().unwrap();
    let bytes = result.received_bytes().unwrap();
    assert_eq!(bytes.len(), 4);
    assert!(bytes.values().all(|byte| *byte == expected));

    for run in result.results.values() {
        let run = run.as_ref().unwrap();
        // 24 states, 10 ms each
        assert!(run.elapsed >= Duration::from_millis(240));
        assert_eq!(run.transcript.rounds().len(), 24);
    }
}

#[test_log::test(tokio::test(start_paused = true))]
async fn malformed_broadcast() {
    let cancellation = CancellationToken::new();
    let (handles, mut endpoint, mut provider) = spawn_honest_nodes(ProtocolParams::default(), &cancellation);

    // D follows the handshake, then broadcasts garbage in the first bit round.
    for peer in ['A', 'B', 'C'] {
        endpoint.send(&peer, "8x3".into()).await.unwrap();
    }
    for peer in ['A', 'B', 'C'] {
        assert_eq!(endpoint.receive(&peer).await.unwrap(), "8x3");
    }
    let _share = provider.establish(RoundId::bit(0, 0)).await.unwrap();
    for peer in ['A', 'B', 'C'] {
        endpoint.send(&peer, "x".into()).await.unwrap();
    }

    for handle in handles {
        let error = handle.await.unwrap().unwrap_err();
        assert_eq!(
            error,
            Error::Protocol(ProtocolError::MalformedMessage {
                round: RoundId::bit(0, 0),
                from: 'D',
                text: "x".into(),
            })
        );
    }
}

#[test_log::test(tokio::test(start_paused = true))]
async fn silent_peer_times_out() {
    let params = ProtocolParams {
        round_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let cancellation = CancellationToken::new();
    let (handles, _endpoint, _provider) = spawn_honest_nodes(params, &cancellation);

    for handle in handles {
        let error = handle.await.unwrap().unwrap_err();
        assert_eq!(
            error,
            Error::Timeout(TimeoutError {
                round: RoundId::Handshake,
                missing: vec!['D'],
            })
        );
    }
}

#[test_log::test(tokio::test(start_paused = true))]
async fn cancellation_terminates_the_run() {
    let cancellation = CancellationToken::new();
    let (handles, _endpoint, _provider) = spawn_honest_nodes(ProtocolParams::default(), &cancellation);

    tokio::time::sleep(Duration::from_secs(60)).await;
    cancellation.cancel();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap_err(), Error::Terminated);
    }
}
