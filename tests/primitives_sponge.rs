//! Sponge-level tests: chunking, padding and the incremental state matrix.
//!
//! These cross-check the block-by-block absorption against independent
//! keccak256 and SHA3-256 implementations.

use alloy_primitives::keccak256;
use large_preimage::{
    chunker::{block_count, chunk, reassemble},
    config::{KECCAK_RATE, STATE_SNAPSHOT_BYTES},
    LargePreimageError, PaddingRule, StateMatrix,
};
use sha3::{Digest, Sha3_256};

mod common;

use common::fixtures::seeded_bytes;

fn absorb_all(data: &[u8], padding: PaddingRule) -> StateMatrix {
    let mut matrix = StateMatrix::new(KECCAK_RATE).unwrap();
    for block in chunk(data, KECCAK_RATE, padding).unwrap() {
        matrix.absorb_block(&block).unwrap();
    }
    matrix
}

#[test]
fn test_chunk_round_trip() {
    for len in [1usize, 135, 136, 137, 271, 272, 1000, 5000] {
        let data = seeded_bytes(len, len as u64);
        let blocks = chunk(&data, KECCAK_RATE, PaddingRule::KECCAK).unwrap();
        assert_eq!(reassemble(&blocks), data, "length {}", len);
        assert_eq!(blocks.len(), block_count(len, KECCAK_RATE));
        assert!(blocks.iter().all(|b| b.padded.len() == KECCAK_RATE));
        assert!(blocks[..blocks.len() - 1].iter().all(|b| !b.is_final));
        assert!(blocks.last().unwrap().is_final);
    }
}

#[test]
fn test_block_count_for_1000_bytes() {
    assert_eq!(block_count(1000, KECCAK_RATE), 8);
    let blocks = chunk(&[0u8; 1000], KECCAK_RATE, PaddingRule::KECCAK).unwrap();
    assert_eq!(blocks[7].data_len, 1000 - 7 * KECCAK_RATE);
}

#[test]
fn test_invalid_rates_rejected() {
    for rate in [0usize, 3, 200, 256] {
        let err = chunk(&[1u8; 10], rate, PaddingRule::KECCAK).unwrap_err();
        assert!(matches!(err, LargePreimageError::InvalidRate { .. }), "rate {}", rate);
    }
}

#[test]
fn test_keccak256_cross_check() {
    for len in [1usize, 31, 135, 136, 137, 500, 1000, 4096] {
        let data = seeded_bytes(len, 7);
        let matrix = absorb_all(&data, PaddingRule::KECCAK);
        assert_eq!(matrix.digest(), keccak256(&data), "length {}", len);
        assert_eq!(matrix.blocks_absorbed(), block_count(len, KECCAK_RATE));
    }
}

#[test]
fn test_sha3_256_cross_check() {
    // SHA3-256 shares keccak256's rate; only the domain byte differs.
    for len in [1usize, 135, 136, 1000] {
        let data = seeded_bytes(len, 9);
        let matrix = absorb_all(&data, PaddingRule::SHA3);
        let expected = Sha3_256::digest(&data);
        assert_eq!(matrix.digest().as_slice(), expected.as_slice(), "length {}", len);
    }
}

#[test]
fn test_state_commitment_is_keccak_of_snapshot() {
    let mut matrix = StateMatrix::new(KECCAK_RATE).unwrap();
    let initial = matrix.state_commitment();
    assert_eq!(initial, keccak256([0u8; STATE_SNAPSHOT_BYTES]));

    matrix.absorb(&[0u8; KECCAK_RATE]).unwrap();
    assert_ne!(matrix.state_commitment(), initial);
    assert_eq!(matrix.state_commitment(), keccak256(matrix.snapshot()));
}

#[test]
fn test_absorb_is_deterministic() {
    let data = seeded_bytes(700, 3);
    assert_eq!(
        absorb_all(&data, PaddingRule::KECCAK),
        absorb_all(&data, PaddingRule::KECCAK)
    );
}
