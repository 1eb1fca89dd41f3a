//! Splitting preimages into sponge absorption blocks.
//!
//! Every block is exactly `rate` bytes once padded. The final block always
//! carries the padding, so a preimage whose length is a multiple of the rate
//! gains one extra block made of padding alone. That is what `keccak256` does
//! and what the oracle re-derives when it squeezes.

use crate::config::{validate_rate, PaddingRule};
use crate::{LargePreimageError, Result};

/// One absorption block of a preimage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Zero-based position in the preimage.
    pub index: usize,
    /// Full `rate`-byte buffer handed to the permutation (padded if final).
    pub padded: Vec<u8>,
    /// Number of leading bytes of `padded` that belong to the preimage.
    pub data_len: usize,
    /// Whether this block closes the sponge.
    pub is_final: bool,
}

impl Block {
    /// The unpadded preimage bytes of this block.
    pub fn data(&self) -> &[u8] {
        &self.padded[..self.data_len]
    }
}

/// Number of blocks a preimage of `len` bytes produces at `rate`.
pub fn block_count(len: usize, rate: usize) -> usize {
    len / rate + 1
}

/// Splits `data` into ordered, padded blocks.
///
/// Fails with `EmptyData` on empty input and `InvalidRate` on an unusable rate.
pub fn chunk(data: &[u8], rate: usize, padding: PaddingRule) -> Result<Vec<Block>> {
    if data.is_empty() {
        return Err(LargePreimageError::EmptyData {
            operation: "chunk".to_string(),
        });
    }
    validate_rate(rate)?;

    let total = block_count(data.len(), rate);
    let mut blocks = Vec::with_capacity(total);

    for index in 0..total {
        let start = index * rate;
        let end = (start + rate).min(data.len());
        let piece = &data[start..end];
        let is_final = index + 1 == total;

        let padded = if is_final {
            padding.pad(piece, rate)
        } else {
            piece.to_vec()
        };

        blocks.push(Block {
            index,
            padded,
            data_len: piece.len(),
            is_final,
        });
    }

    Ok(blocks)
}

/// Concatenates the unpadded contents of ordered blocks.
pub fn reassemble(blocks: &[Block]) -> Vec<u8> {
    blocks.iter().flat_map(|b| b.data().iter().copied()).collect()
}
