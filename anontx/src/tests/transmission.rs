use alloc::{collections::BTreeMap, string::ToString, vec, vec::Vec};
use core::time::Duration;

use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;

use crate::{
    dev::{run_sync, ExecutionResult, GhzSampler},
    protocol::{Byte, Error, ProtocolError, RoundId, TimeoutError},
    session::AnonymousTransmission,
};

const LINE: [char; 4] = ['A', 'B', 'C', 'D'];

fn programs(sender: char, payload: &str, correction: bool) -> Vec<AnonymousTransmission<char>> {
    LINE.iter()
        .map(|id| {
            let payload = (*id == sender).then_some(payload);
            AnonymousTransmission::new(*id, &LINE, payload, Some(correction)).unwrap()
        })
        .collect()
}

fn execute(sampler: &mut GhzSampler<ChaCha8Rng>, programs: Vec<AnonymousTransmission<char>>) -> ExecutionResult<char> {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    run_sync(&mut rng, sampler, programs).unwrap()
}

#[test]
fn every_byte_arrives_intact() {
    let mut sampler = GhzSampler::new(ChaCha8Rng::seed_from_u64(1));
    for value in 0..=u8::MAX {
        let byte = Byte::from(value);
        let bytes = execute(&mut sampler, programs('C', &byte.to_string(), false))
            .received_bytes()
            .unwrap();
        assert_eq!(bytes.len(), LINE.len());
        assert!(bytes.values().all(|received| *received == byte), "{byte}: {bytes:?}");
    }
}

#[test]
fn four_nodes_with_correction() {
    let mut sampler = GhzSampler::new(ChaCha8Rng::seed_from_u64(2));
    let result = execute(&mut sampler, programs('B', "11111111", true));

    let expected = "11111111".parse::<Byte>().unwrap();
    let bytes = result.received_bytes().unwrap();
    assert_eq!(bytes, LINE.iter().map(|id| (*id, expected)).collect::<BTreeMap<_, _>>());

    for run in result.results.values() {
        let run = run.as_ref().unwrap();
        // 8 bits, 3 repetitions each
        assert_eq!(run.transcript.rounds().len(), 24);
        assert!(run.transcript.rounds().iter().all(|record| record.corrected));
        assert!(run.transcript.outcomes().all(|(_, outcome)| outcome));
    }
}

#[test]
fn a_single_error_per_bit_is_masked() {
    // One corrupted repetition for every bit, at a different repetition each time.
    let corrupted = (0..8).map(|position| RoundId::bit(position, position % 3)).collect::<Vec<_>>();
    let mut sampler = GhzSampler::new(ChaCha8Rng::seed_from_u64(3)).with_corrupted_rounds(corrupted);

    let bytes = execute(&mut sampler, programs('D', "10010110", true))
        .received_bytes()
        .unwrap();
    assert!(bytes.values().all(|byte| byte.to_string() == "10010110"));
}

#[test]
fn errors_go_through_without_correction() {
    let corrupted = [RoundId::bit(0, 0), RoundId::bit(5, 0)];
    let mut sampler = GhzSampler::new(ChaCha8Rng::seed_from_u64(4)).with_corrupted_rounds(corrupted);

    let result = execute(&mut sampler, programs('A', "00000000", false));
    let bytes = result.received_bytes().unwrap();
    assert!(bytes.values().all(|byte| byte.to_string() == "10000100"));

    for run in result.results.values() {
        let transcript = &run.as_ref().unwrap().transcript;
        assert_eq!(transcript.rounds().len(), 8);
        assert!(transcript.rounds().iter().all(|record| !record.corrected));
    }
}

#[test]
fn mismatched_correction_flags_fail_the_handshake() {
    let mut programs = programs('B', "10101010", false);
    programs[1] = AnonymousTransmission::new('B', &LINE, Some("10101010"), Some(true)).unwrap();

    let mut sampler = GhzSampler::new(ChaCha8Rng::seed_from_u64(5));
    let errors = execute(&mut sampler, programs).errors();
    assert_eq!(errors.len(), LINE.len());
    for error in errors.values() {
        assert!(
            matches!(error, Error::Protocol(ProtocolError::PlanMismatch { .. })),
            "{error}"
        );
    }
    assert_eq!(
        errors.get(&'A'),
        Some(&Error::Protocol(ProtocolError::PlanMismatch {
            from: 'B',
            local: "8x1".into(),
            remote: "8x3".into()
        }))
    );
}

#[test]
fn absent_peer_stalls_the_handshake() {
    let programs = programs('B', "10101010", false).into_iter().take(3).collect::<Vec<_>>();

    let mut sampler = GhzSampler::new(ChaCha8Rng::seed_from_u64(6));
    let errors = execute(&mut sampler, programs).errors();
    for id in ['A', 'B', 'C'] {
        assert_eq!(
            errors.get(&id),
            Some(&Error::Timeout(TimeoutError {
                round: RoundId::Handshake,
                missing: vec!['D'],
            }))
        );
    }
}

#[test]
fn elapsed_time_is_the_generation_time() {
    let mut sampler = GhzSampler::new(ChaCha8Rng::seed_from_u64(7)).with_generation_time(Duration::from_millis(10));
    let result = execute(&mut sampler, programs('B', "01010101", true));
    for run in result.results.values() {
        assert_eq!(run.as_ref().unwrap().elapsed, Duration::from_millis(240));
    }
}
