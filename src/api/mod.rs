//! High-level API for uploading large preimages to the oracle.
//!
//! Preimages too large for a single transaction are proposed in stages:
//! a claim is opened, the preimage is streamed in as chained sponge blocks,
//! and the claim is closed with a proof that lets anyone check a single block
//! transition against the committed tree.
//!
//! ## Core Workflow
//!
//! 1. **`prepare_upload()`**: Splits the preimage into blocks, absorbs them one
//!    by one and records every state transition as a `LeafRecord`. The leaf
//!    hashes are appended to a `CommitmentTree`. Nothing is submitted.
//! 2. **`UploadCoordinator::upload_preimage()`**: Turns a prepared upload into
//!    `initLPP`, `addLeavesLPP` and `squeezeLPP` transactions, hands each stage
//!    to the sender and tracks claim progress so interrupted uploads resume.
//! 3. **`proof::materialize()`**: Builds the `FinalizationProof` for the last
//!    block (or any block named by a challenge).
//! 4. **`FinalizationProof::verify()`**: Re-checks a proof without the tree.
//!
//! ## Example
//!
//! ```rust,no_run
//! use alloy_primitives::Address;
//! use large_preimage::api::{PreimageOracleData, UploadCoordinator};
//! use large_preimage::contract::AbiOracleBinding;
//! use large_preimage::sender::RecordingSender;
//! use large_preimage::UploadConfig;
//!
//! let config = UploadConfig::for_oracle(Address::repeat_byte(0xaa));
//! let oracle = AbiOracleBinding::new(config.oracle, config.rate);
//! let sender = RecordingSender::new(Address::repeat_byte(0x01));
//!
//! let mut coordinator = UploadCoordinator::new(config, oracle, &sender)?;
//! let data = PreimageOracleData::new(vec![7u8; 1000], 0);
//! let outcome = coordinator.upload_preimage(0, &data)?;
//!
//! assert_eq!(outcome.transactions.len(), 3);
//! outcome.proof.verify(coordinator.config().odd_node)?;
//! # Ok::<(), large_preimage::LargePreimageError>(())
//! ```

// Declare sub-modules
mod claim;
mod coordinator;
pub mod proof;
mod types;

// Re-export the public API
pub use claim::{ClaimProgress, ClaimState};
pub use coordinator::UploadCoordinator;
pub use proof::{materialize, ProofTarget};
pub use types::{
    Claim, FinalizationProof, InputBatch, LeafRecord, PreimageOracleData, PreparedUpload,
    ProvenLeaf, UploadOutcome,
};

use alloy_primitives::Address;
use tracing::{debug, debug_span};

use crate::chunker::chunk;
use crate::config::UploadConfig;
use crate::matrix::StateMatrix;
use crate::merkle::CommitmentTree;
use crate::utils::claim_uuid;
use crate::{LargePreimageError, Result};

/// Derives every block, leaf and tree node of an upload without side effects.
///
/// # Arguments
///
/// * `claimant` - Account that will own the claim
/// * `data` - The preimage and its part offset
/// * `config` - Sponge rate, padding and tree convention to prepare against
///
/// # Returns
///
/// Returns a `PreparedUpload` whose leaves chain from the zero state to the
/// state whose digest is the preimage hash.
pub fn prepare_upload(
    claimant: Address,
    data: &PreimageOracleData,
    config: &UploadConfig,
) -> Result<PreparedUpload> {
    let _span = debug_span!("prepare_upload", data_size = data.data.len(), offset = data.offset)
        .entered();

    if data.is_empty() {
        return Err(LargePreimageError::NilPreimageData);
    }
    config.validate()?;

    let claimed_size = u32::try_from(data.data.len()).map_err(|_| LargePreimageError::Encoding {
        call: "initLPP(uint256,uint32,uint32)",
        details: format!("preimage of {} bytes overflows uint32", data.data.len()),
    })?;
    // The part read back includes the 8-byte length prefix.
    if u64::from(data.offset) >= u64::from(claimed_size) + 8 {
        return Err(LargePreimageError::InvalidInput(format!(
            "part offset {} is beyond a preimage of {} bytes",
            data.offset, claimed_size
        )));
    }

    let claim = Claim {
        uuid: claim_uuid(claimant, &data.data, data.offset),
        part_offset: data.offset,
        claimed_size,
        owner: claimant,
    };

    // 1. Chunk into padded blocks
    let blocks = chunk(&data.data, config.rate, config.padding)?;

    // 2. Absorb in order, recording each transition
    let mut matrix = StateMatrix::new(config.rate)?;
    let mut tree = CommitmentTree::new(config.odd_node);
    let mut leaves = Vec::with_capacity(blocks.len());

    for block in blocks {
        let pre_state = matrix.state_commitment();
        matrix.absorb_block(&block)?;
        let leaf = LeafRecord {
            index: block.index,
            input: block.padded,
            data_len: block.data_len,
            pre_state,
            post_state: matrix.state_commitment(),
        };

        // 3. Extend the commitment tree
        tree.append(leaf.hash())?;
        leaves.push(leaf);
    }

    debug!(
        uuid = %claim.uuid,
        blocks = leaves.len(),
        root = %tree.root(),
        "prepared upload"
    );

    Ok(PreparedUpload {
        claim,
        leaves,
        tree,
        final_state: matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    #[test]
    fn prepare_1000_bytes() {
        let data = PreimageOracleData::new(vec![0x5a; 1000], 0);
        let upload = prepare_upload(Address::repeat_byte(1), &data, &UploadConfig::default()).unwrap();
        assert_eq!(upload.block_count(), 8);
        assert_eq!(upload.claim.claimed_size, 1000);
        assert_eq!(upload.digest(), keccak256(&data.data));
        assert_eq!(upload.tree.len(), 8);
        assert!(proof::check_chaining(&upload.leaves).is_ok());
    }

    #[test]
    fn nil_data_rejected() {
        let data = PreimageOracleData::new(Vec::new(), 0);
        let err = prepare_upload(Address::ZERO, &data, &UploadConfig::default()).unwrap_err();
        assert!(matches!(err, LargePreimageError::NilPreimageData));
    }

    #[test]
    fn offset_past_end_rejected() {
        let config = UploadConfig::default();
        let ok = PreimageOracleData::new(vec![1u8; 10], 17);
        assert!(prepare_upload(Address::ZERO, &ok, &config).is_ok());
        let bad = PreimageOracleData::new(vec![1u8; 10], 18);
        assert!(prepare_upload(Address::ZERO, &bad, &config).is_err());
    }

    #[test]
    fn batches_respect_ceiling() {
        let data = PreimageOracleData::new(vec![3u8; 1000], 0);
        let upload = prepare_upload(Address::ZERO, &data, &UploadConfig::default()).unwrap();

        let batches = upload.batches(0, 3);
        assert_eq!(
            batches.iter().map(InputBatch::len).collect::<Vec<_>>(),
            vec![3, 3, 2]
        );
        assert_eq!(
            batches.iter().map(|b| b.finalize).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        let total: usize = batches.iter().map(|b| b.input.len()).sum();
        assert_eq!(total, 1000);

        let tail = upload.batches(3, 300);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].first_block, 3);
        assert!(upload.batches(8, 300).is_empty());
    }
}
