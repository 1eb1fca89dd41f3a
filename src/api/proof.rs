//! Finalization proof materialization.
//!
//! Given the commitment tree and the leaf records of a claim, picks the
//! target leaf and its chained predecessor, proves both against the same
//! root and rebuilds the sponge state the oracle needs to replay the target
//! block.

use tracing::{debug, debug_span};

use super::types::{FinalizationProof, LeafRecord, ProvenLeaf};
use crate::matrix::StateMatrix;
use crate::merkle::CommitmentTree;
use crate::{LargePreimageError, Result};

/// Which leaf a finalization proof reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofTarget {
    /// The last absorbed block (the squeeze case).
    Last,
    /// A specific block, e.g. one named by a challenge.
    Index(usize),
}

/// Builds a [`FinalizationProof`] for `target`.
///
/// The pre-state matrix is rebuilt by replaying the leaf inputs from a zero
/// state, which also re-checks that every leaf up to the target chains and
/// matches its recorded commitments.
pub fn materialize(
    tree: &CommitmentTree,
    leaves: &[LeafRecord],
    rate: usize,
    target: ProofTarget,
) -> Result<FinalizationProof> {
    if tree.len() != leaves.len() {
        return Err(LargePreimageError::TreeSizeMismatch {
            tree: tree.len(),
            records: leaves.len(),
        });
    }

    let index = match target {
        ProofTarget::Last => leaves.len().checked_sub(1).ok_or_else(|| {
            LargePreimageError::IndexOutOfBounds {
                index: 0,
                length: 0,
            }
        })?,
        ProofTarget::Index(i) => i,
    };
    if index >= leaves.len() {
        return Err(LargePreimageError::IndexOutOfBounds {
            index,
            length: leaves.len(),
        });
    }

    let _span = debug_span!("materialize", index, leaves = leaves.len()).entered();

    let prestate_matrix = replay_to(leaves, index, rate)?;

    let target_leaf = &leaves[index];
    if prestate_matrix.state_commitment() != target_leaf.pre_state {
        return Err(LargePreimageError::ChainingViolation {
            index,
            expected: prestate_matrix.state_commitment(),
            found: target_leaf.pre_state,
        });
    }

    let preceding = match index.checked_sub(1) {
        Some(pre_index) => {
            let pre_leaf = &leaves[pre_index];
            check_chain(pre_leaf, target_leaf)?;
            Some(prove_leaf(tree, pre_leaf)?)
        }
        None => None,
    };
    let target = prove_leaf(tree, target_leaf)?;

    debug!(root = %tree.root(), has_preceding = preceding.is_some(), "materialized finalization proof");

    Ok(FinalizationProof {
        root: tree.root(),
        prestate_matrix,
        preceding,
        target,
    })
}

/// Checks `leaf[i].post_state == leaf[i+1].pre_state` for every adjacent pair.
pub fn check_chaining(leaves: &[LeafRecord]) -> Result<()> {
    for pair in leaves.windows(2) {
        check_chain(&pair[0], &pair[1])?;
    }
    Ok(())
}

fn check_chain(pre: &LeafRecord, post: &LeafRecord) -> Result<()> {
    if pre.post_state != post.pre_state {
        return Err(LargePreimageError::ChainingViolation {
            index: pre.index,
            expected: pre.post_state,
            found: post.pre_state,
        });
    }
    Ok(())
}

fn prove_leaf(tree: &CommitmentTree, leaf: &LeafRecord) -> Result<ProvenLeaf> {
    let proof = tree.proof(leaf.index)?;
    if tree.leaves()[leaf.index] != leaf.hash() {
        return Err(LargePreimageError::ProofMismatch {
            index: leaf.index,
            root: tree.root(),
        });
    }
    Ok(ProvenLeaf {
        leaf: leaf.clone(),
        proof,
    })
}

/// Sponge state after absorbing `leaves[..index]`.
fn replay_to(leaves: &[LeafRecord], index: usize, rate: usize) -> Result<StateMatrix> {
    let mut matrix = StateMatrix::new(rate)?;
    for leaf in &leaves[..index] {
        if leaf.pre_state != matrix.state_commitment() {
            return Err(LargePreimageError::ChainingViolation {
                index: leaf.index,
                expected: matrix.state_commitment(),
                found: leaf.pre_state,
            });
        }
        matrix.absorb(&leaf.input)?;
        if leaf.post_state != matrix.state_commitment() {
            return Err(LargePreimageError::ChainingViolation {
                index: leaf.index,
                expected: matrix.state_commitment(),
                found: leaf.post_state,
            });
        }
    }
    Ok(matrix)
}
