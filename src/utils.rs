//! Stateless helper functions for the large preimage engine

use alloy_primitives::{keccak256, Address, B256, U256};

/// Type byte of a keccak256 preimage key.
pub const KECCAK256_KEY_TYPE: u8 = 2;

/// Derives the claim uuid for `data` uploaded by `claimant` at `offset`.
///
/// `uuid = keccak256(data ‖ le32(offset) ‖ claimant)`, read as a big-endian
/// integer. The same inputs always map to the same claim, which is what
/// makes re-uploads resumable.
pub fn claim_uuid(claimant: Address, data: &[u8], offset: u32) -> U256 {
    let mut buf = Vec::with_capacity(data.len() + 4 + 20);
    buf.extend_from_slice(data);
    buf.extend_from_slice(&offset.to_le_bytes());
    buf.extend_from_slice(claimant.as_slice());
    U256::from_be_bytes(keccak256(&buf).0)
}

/// Oracle key under which a keccak256 preimage is stored: the digest with
/// its first byte replaced by the key type.
pub fn keccak_preimage_key(data: &[u8]) -> B256 {
    let mut key = keccak256(data);
    key.0[0] = KECCAK256_KEY_TYPE;
    key
}

/// Big-endian 32-byte encoding of an index, as the oracle hashes it.
pub fn index_word(index: usize) -> [u8; 32] {
    U256::from(index).to_be_bytes::<32>()
}
