//! Core API data types and structures.
//!
//! - PreimageOracleData: the preimage handed to the uploader
//! - Claim: one uuid-scoped large preimage upload
//! - LeafRecord: one absorbed block and its chained state transition
//! - InputBatch: the payload of a single AddLeaves call
//! - PreparedUpload: everything derived from a preimage before any call is sent
//! - FinalizationProof: the adjacent-leaf pair and proofs consumed by Squeeze

use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::matrix::StateMatrix;
use crate::merkle::{verify_proof, CommitmentTree, MerkleProof};
use crate::metrics::UploadMetrics;
use crate::utils::index_word;
use crate::config::{OddNodePolicy, STATE_SNAPSHOT_BYTES};
use crate::contract::TxCandidate;
use crate::{LargePreimageError, Result};

/// A preimage together with its place in the oracle's part namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreimageOracleData {
    /// Raw preimage bytes, without any length prefix.
    pub data: Vec<u8>,
    /// Offset of the part the claim will expose once finalized.
    pub offset: u32,
}

impl PreimageOracleData {
    pub fn new(data: impl Into<Vec<u8>>, offset: u32) -> Self {
        Self {
            data: data.into(),
            offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A single large preimage proposal, unique per `(owner, uuid)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub uuid: U256,
    pub part_offset: u32,
    pub claimed_size: u32,
    pub owner: Address,
}

/// One absorbed block with the state commitments around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRecord {
    /// Zero-based block index.
    pub index: usize,
    /// The padded `rate`-byte block that was absorbed.
    pub input: Vec<u8>,
    /// How many leading bytes of `input` are preimage data.
    pub data_len: usize,
    /// State commitment before this block was absorbed.
    pub pre_state: B256,
    /// State commitment after this block was absorbed.
    pub post_state: B256,
}

impl LeafRecord {
    /// The commitment posted for this leaf in AddLeaves.
    pub fn commitment(&self) -> B256 {
        self.post_state
    }

    /// Merkle leaf value: `keccak256(input ‖ uint256(index) ‖ commitment)`.
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(self.input.len() + 64);
        buf.extend_from_slice(&self.input);
        buf.extend_from_slice(&index_word(self.index));
        buf.extend_from_slice(self.commitment().as_slice());
        keccak256(&buf)
    }

    /// The unpadded preimage bytes of this leaf.
    pub fn data(&self) -> &[u8] {
        &self.input[..self.data_len]
    }
}

/// Payload of one AddLeaves call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBatch {
    /// Index of the first block covered by this batch.
    pub first_block: usize,
    /// Unpadded preimage bytes of the covered blocks.
    pub input: Vec<u8>,
    /// One state commitment per covered block.
    pub commitments: Vec<B256>,
    /// Set only on the batch carrying the last block.
    pub finalize: bool,
}

impl InputBatch {
    /// Number of blocks in the batch.
    pub fn len(&self) -> usize {
        self.commitments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commitments.is_empty()
    }

    /// One past the last block index covered.
    pub fn end_block(&self) -> usize {
        self.first_block + self.len()
    }
}

/// Everything derived from a preimage before anything is submitted.
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub claim: Claim,
    /// Chained leaf records, one per block.
    pub leaves: Vec<LeafRecord>,
    /// Commitment tree over the leaf hashes.
    pub tree: CommitmentTree,
    /// Sponge state after the final block; its digest is the preimage hash.
    pub final_state: StateMatrix,
}

impl PreparedUpload {
    /// Number of blocks in the preimage.
    pub fn block_count(&self) -> usize {
        self.leaves.len()
    }

    /// keccak256 of the preimage, read off the final sponge state.
    pub fn digest(&self) -> B256 {
        self.final_state.digest()
    }

    /// AddLeaves payloads covering blocks `start_block..`, at most
    /// `max_blocks` blocks each.
    ///
    /// Batches depend only on block indices, so a resumed upload produces the
    /// same tail regardless of how earlier batches were cut.
    pub fn batches(&self, start_block: usize, max_blocks: usize) -> Vec<InputBatch> {
        let max_blocks = max_blocks.max(1);
        let total = self.leaves.len();
        if start_block >= total {
            return Vec::new();
        }

        self.leaves[start_block..]
            .chunks(max_blocks)
            .map(|leaves| {
                let first_block = leaves[0].index;
                let input = leaves.iter().flat_map(|l| l.data().iter().copied()).collect();
                let commitments = leaves.iter().map(LeafRecord::commitment).collect();
                let finalize = first_block + leaves.len() == total;
                InputBatch {
                    first_block,
                    input,
                    commitments,
                    finalize,
                }
            })
            .collect()
    }
}

/// A leaf plus its inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenLeaf {
    pub leaf: LeafRecord,
    pub proof: MerkleProof,
}

/// The adjacent-leaf pair and proofs that let a verifier check one block
/// transition without re-absorbing the whole preimage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizationProof {
    /// Root both proofs are taken against.
    pub root: B256,
    /// Sponge state before the target block, as the oracle reconstructs it.
    pub prestate_matrix: StateMatrix,
    /// The leaf chained into the target; absent when the target is block 0.
    pub preceding: Option<ProvenLeaf>,
    /// The leaf whose transition is revealed.
    pub target: ProvenLeaf,
}

impl FinalizationProof {
    /// Re-checks the proof independently of the tree that produced it.
    ///
    /// Both leaves must prove against `root`, they must chain, and absorbing
    /// the target block into `prestate_matrix` must yield the target's
    /// post-state commitment.
    pub fn verify(&self, policy: OddNodePolicy) -> Result<()> {
        let target = &self.target;
        if !verify_proof(self.root, target.leaf.hash(), &target.proof, policy) {
            return Err(LargePreimageError::ProofMismatch {
                index: target.leaf.index,
                root: self.root,
            });
        }
        if target.proof.index != target.leaf.index {
            return Err(LargePreimageError::InvalidInput(format!(
                "target proof is for index {}, leaf is {}",
                target.proof.index, target.leaf.index
            )));
        }

        match &self.preceding {
            Some(pre) => {
                if pre.leaf.index + 1 != target.leaf.index || pre.proof.index != pre.leaf.index {
                    return Err(LargePreimageError::InvalidInput(format!(
                        "leaf {} does not precede leaf {}",
                        pre.leaf.index, target.leaf.index
                    )));
                }
                if !verify_proof(self.root, pre.leaf.hash(), &pre.proof, policy) {
                    return Err(LargePreimageError::ProofMismatch {
                        index: pre.leaf.index,
                        root: self.root,
                    });
                }
                if pre.leaf.post_state != target.leaf.pre_state {
                    return Err(LargePreimageError::ChainingViolation {
                        index: pre.leaf.index,
                        expected: pre.leaf.post_state,
                        found: target.leaf.pre_state,
                    });
                }
            }
            None if target.leaf.index != 0 => {
                return Err(LargePreimageError::InvalidInput(format!(
                    "leaf {} has no preceding leaf",
                    target.leaf.index
                )));
            }
            None => {}
        }

        if self.prestate_matrix.state_commitment() != target.leaf.pre_state {
            return Err(LargePreimageError::ChainingViolation {
                index: target.leaf.index,
                expected: self.prestate_matrix.state_commitment(),
                found: target.leaf.pre_state,
            });
        }

        let mut post = self.prestate_matrix.clone();
        post.absorb(&target.leaf.input)?;
        if post.state_commitment() != target.leaf.post_state {
            return Err(LargePreimageError::ChainingViolation {
                index: target.leaf.index,
                expected: post.state_commitment(),
                found: target.leaf.post_state,
            });
        }

        Ok(())
    }

    /// Size of the squeeze arguments that scale with the proof.
    pub fn encoded_size_hint(&self) -> usize {
        let proof_words = self.target.proof.siblings.len()
            + self.preceding.as_ref().map_or(0, |p| p.proof.siblings.len());
        STATE_SNAPSHOT_BYTES + proof_words * 32 + 2 * self.target.leaf.input.len()
    }
}

/// Result of a successful `upload_preimage` call.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Caller-supplied claim index the upload was made for.
    pub claim_index: u64,
    pub claim: Claim,
    /// Transactions handed to the sender during this call, in order.
    pub transactions: Vec<TxCandidate>,
    /// The finalization proof for the last block.
    pub proof: FinalizationProof,
    pub metrics: UploadMetrics,
}
