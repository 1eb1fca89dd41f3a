//! Incremental keccak-f[1600] sponge state.
//!
//! [`StateMatrix`] absorbs one block per call and exposes the intermediate
//! state in the exact layout the oracle contract rebuilds: an ABI-encoded
//! `uint64[25]`, one big-endian 32-byte word per lane, lanes in `x + 5y`
//! order. The state commitment posted for every leaf is the keccak256 of
//! that snapshot.

use alloy_primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};

use crate::chunker::Block;
use crate::config::{
    validate_rate, PaddingRule, KECCAK_STATE_BYTES, KECCAK_STATE_LANES, STATE_SNAPSHOT_BYTES,
};
use crate::{LargePreimageError, Result};

/// The 25-lane keccak state of a single claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMatrix {
    lanes: [u64; KECCAK_STATE_LANES],
    rate: usize,
    absorbed: usize,
}

impl StateMatrix {
    /// A zeroed state absorbing `rate` bytes per block.
    pub fn new(rate: usize) -> Result<Self> {
        validate_rate(rate)?;
        Ok(Self {
            lanes: [0u64; KECCAK_STATE_LANES],
            rate,
            absorbed: 0,
        })
    }

    /// Rebuilds a matrix from raw lanes, e.g. a pre-state read back from a proof.
    pub fn from_lanes(lanes: [u64; KECCAK_STATE_LANES], rate: usize, absorbed: usize) -> Result<Self> {
        validate_rate(rate)?;
        Ok(Self {
            lanes,
            rate,
            absorbed,
        })
    }

    pub fn lanes(&self) -> &[u64; KECCAK_STATE_LANES] {
        &self.lanes
    }

    pub fn rate(&self) -> usize {
        self.rate
    }

    /// Number of blocks absorbed so far.
    pub fn blocks_absorbed(&self) -> usize {
        self.absorbed
    }

    /// XORs a full `rate`-byte block into the state, applies one permutation
    /// and returns the resulting digest.
    pub fn absorb(&mut self, block: &[u8]) -> Result<B256> {
        if block.len() != self.rate {
            return Err(LargePreimageError::InvalidBlockLength {
                got: block.len(),
                rate: self.rate,
            });
        }
        for (lane, word) in self.lanes.iter_mut().zip(block.chunks_exact(8)) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(word);
            *lane ^= u64::from_le_bytes(bytes);
        }
        keccak::f1600(&mut self.lanes);
        self.absorbed += 1;
        Ok(self.digest())
    }

    /// Absorbs a chunker block, checking it arrives in order.
    pub fn absorb_block(&mut self, block: &Block) -> Result<B256> {
        if block.index != self.absorbed {
            return Err(LargePreimageError::InvalidInput(format!(
                "block {} absorbed out of order (expected block {})",
                block.index, self.absorbed
            )));
        }
        self.absorb(&block.padded)
    }

    /// Pads (when final) and absorbs raw leaf input.
    pub fn absorb_leaf_input(
        &mut self,
        data: &[u8],
        is_final: bool,
        padding: PaddingRule,
    ) -> Result<B256> {
        if is_final {
            if data.len() >= self.rate {
                return Err(LargePreimageError::InvalidBlockLength {
                    got: data.len(),
                    rate: self.rate,
                });
            }
            let padded = padding.pad(data, self.rate);
            self.absorb(&padded)
        } else {
            self.absorb(data)
        }
    }

    /// The first 32 bytes of the state: the hash output once the final
    /// block has been absorbed.
    pub fn digest(&self) -> B256 {
        let mut out = [0u8; 32];
        for (chunk, lane) in out.chunks_exact_mut(8).zip(self.lanes.iter()) {
            chunk.copy_from_slice(&lane.to_le_bytes());
        }
        B256::from(out)
    }

    /// Full state as little-endian bytes, 200 bytes long.
    pub fn state_bytes(&self) -> [u8; KECCAK_STATE_BYTES] {
        let mut out = [0u8; KECCAK_STATE_BYTES];
        for (chunk, lane) in out.chunks_exact_mut(8).zip(self.lanes.iter()) {
            chunk.copy_from_slice(&lane.to_le_bytes());
        }
        out
    }

    /// ABI encoding of the lanes as `uint64[25]`.
    pub fn snapshot(&self) -> Vec<u8> {
        let mut out = vec![0u8; STATE_SNAPSHOT_BYTES];
        for (word, lane) in out.chunks_exact_mut(32).zip(self.lanes.iter()) {
            word[24..].copy_from_slice(&lane.to_be_bytes());
        }
        out
    }

    /// keccak256 of [`Self::snapshot`], the commitment posted for a leaf.
    pub fn state_commitment(&self) -> B256 {
        keccak256(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::chunk;
    use crate::config::KECCAK_RATE;

    fn absorb_all(data: &[u8]) -> StateMatrix {
        let mut matrix = StateMatrix::new(KECCAK_RATE).unwrap();
        for block in chunk(data, KECCAK_RATE, PaddingRule::KECCAK).unwrap() {
            matrix.absorb_block(&block).unwrap();
        }
        matrix
    }

    #[test]
    fn matches_keccak256() {
        for len in [1usize, 55, 135, 136, 137, 272, 1000] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            assert_eq!(absorb_all(&data).digest(), keccak256(&data), "length {}", len);
        }
    }

    #[test]
    fn snapshot_layout() {
        let mut lanes = [0u64; KECCAK_STATE_LANES];
        lanes[0] = 1;
        lanes[24] = 0x0102_0304_0506_0708;
        let matrix = StateMatrix::from_lanes(lanes, KECCAK_RATE, 0).unwrap();
        let snap = matrix.snapshot();
        assert_eq!(snap.len(), 800);
        assert_eq!(snap[31], 1);
        assert!(snap[..31].iter().all(|b| *b == 0));
        assert_eq!(&snap[792..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn rejects_wrong_block_length() {
        let mut matrix = StateMatrix::new(KECCAK_RATE).unwrap();
        let err = matrix.absorb(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, LargePreimageError::InvalidBlockLength { got: 10, .. }));
        assert_eq!(matrix.blocks_absorbed(), 0);
    }

    #[test]
    fn rejects_out_of_order_blocks() {
        let blocks = chunk(&[3u8; 300], KECCAK_RATE, PaddingRule::KECCAK).unwrap();
        let mut matrix = StateMatrix::new(KECCAK_RATE).unwrap();
        assert!(matrix.absorb_block(&blocks[1]).is_err());
        matrix.absorb_block(&blocks[0]).unwrap();
        assert!(matrix.absorb_block(&blocks[0]).is_err());
    }

    #[test]
    fn leaf_input_path_agrees_with_blocks() {
        let data = vec![9u8; 200];
        let mut direct = StateMatrix::new(KECCAK_RATE).unwrap();
        direct
            .absorb_leaf_input(&data[..KECCAK_RATE], false, PaddingRule::KECCAK)
            .unwrap();
        direct
            .absorb_leaf_input(&data[KECCAK_RATE..], true, PaddingRule::KECCAK)
            .unwrap();
        assert_eq!(direct, absorb_all(&data));
    }
}
