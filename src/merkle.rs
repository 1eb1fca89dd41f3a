//! Keccak Merkle tree over leaf commitments.
//!
//! The tree stores every layer explicitly (`layers[0]` are the leaves) and is
//! extended one leaf at a time, recomputing only the rightmost path. How an
//! unpaired node is closed off is decided by [`OddNodePolicy`]; the default
//! fixed-depth zero-subtree layout is the one the preimage oracle verifies.

use alloy_primitives::{keccak256, B256};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::OddNodePolicy;
use crate::{LargePreimageError, Result};

/// Upper bound on precomputed zero-subtree hashes.
const MAX_ZERO_DEPTH: usize = 64;

/// `ZERO_HASHES[i]` is the root of an empty subtree of height `i`.
static ZERO_HASHES: Lazy<Vec<B256>> = Lazy::new(|| {
    let mut hashes = Vec::with_capacity(MAX_ZERO_DEPTH + 1);
    hashes.push(B256::ZERO);
    for i in 0..MAX_ZERO_DEPTH {
        hashes.push(hash_node(hashes[i], hashes[i]));
    }
    hashes
});

/// Root of an empty subtree of the given height.
pub fn zero_hash(height: usize) -> B256 {
    ZERO_HASHES[height.min(MAX_ZERO_DEPTH)]
}

/// Hashes two sibling nodes.
pub fn hash_node(left: B256, right: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

/// Inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Position of the proven leaf.
    pub index: usize,
    /// Number of leaves in the tree the proof was taken from.
    pub tree_size: usize,
    /// Sibling hashes from the leaf level upwards.
    pub siblings: Vec<B256>,
}

/// Append-only binary Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentTree {
    policy: OddNodePolicy,
    layers: Vec<Vec<B256>>,
}

impl Default for CommitmentTree {
    fn default() -> Self {
        Self::new(OddNodePolicy::default())
    }
}

impl CommitmentTree {
    /// Creates an empty tree using `policy` for unpaired nodes.
    pub fn new(policy: OddNodePolicy) -> Self {
        let height = match policy {
            OddNodePolicy::ZeroSubtree { depth } => depth + 1,
            OddNodePolicy::DuplicateLast | OddNodePolicy::Carry => 1,
        };
        Self {
            policy,
            layers: vec![Vec::new(); height],
        }
    }

    /// Builds a tree from an ordered leaf sequence.
    pub fn from_leaves(policy: OddNodePolicy, leaves: &[B256]) -> Result<Self> {
        let mut tree = Self::new(policy);
        for leaf in leaves {
            tree.append(*leaf)?;
        }
        Ok(tree)
    }

    pub fn policy(&self) -> OddNodePolicy {
        self.policy
    }

    /// Number of leaves appended so far.
    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    pub fn leaves(&self) -> &[B256] {
        &self.layers[0]
    }

    /// Appends a leaf and returns the new root.
    pub fn append(&mut self, leaf: B256) -> Result<B256> {
        if let Some(capacity) = self.policy.capacity() {
            if self.len() >= capacity {
                return Err(LargePreimageError::TreeFull { capacity });
            }
        }

        self.layers[0].push(leaf);
        let mut index = self.len() - 1;
        let mut level = 0;

        while self.has_parent_level(level) {
            let parent = index / 2;
            let node = self.parent_of(level, parent);

            if self.layers.len() == level + 1 {
                self.layers.push(Vec::new());
            }
            let above = &mut self.layers[level + 1];
            if parent < above.len() {
                above[parent] = node;
            } else {
                above.push(node);
            }

            index = parent;
            level += 1;
        }

        Ok(self.root())
    }

    /// Whether `level` still needs folding into a parent.
    fn has_parent_level(&self, level: usize) -> bool {
        match self.policy {
            OddNodePolicy::ZeroSubtree { depth } => level < depth,
            OddNodePolicy::DuplicateLast | OddNodePolicy::Carry => self.layers[level].len() > 1,
        }
    }

    /// Computes parent `parent` from its children on `level`.
    fn parent_of(&self, level: usize, parent: usize) -> B256 {
        let layer = &self.layers[level];
        let left = layer[2 * parent];
        match layer.get(2 * parent + 1) {
            Some(right) => hash_node(left, *right),
            None => match self.policy {
                OddNodePolicy::ZeroSubtree { .. } => hash_node(left, zero_hash(level)),
                OddNodePolicy::DuplicateLast => hash_node(left, left),
                OddNodePolicy::Carry => left,
            },
        }
    }

    /// The current root. An empty tree has the zero-subtree root of its
    /// depth, or `B256::ZERO` for dynamic-height trees.
    pub fn root(&self) -> B256 {
        match self.policy {
            OddNodePolicy::ZeroSubtree { depth } => self.layers[depth]
                .first()
                .copied()
                .unwrap_or_else(|| zero_hash(depth)),
            OddNodePolicy::DuplicateLast | OddNodePolicy::Carry => self
                .layers
                .iter()
                .rev()
                .find_map(|layer| (layer.len() == 1).then(|| layer[0]))
                .unwrap_or(B256::ZERO),
        }
    }

    /// Inclusion proof for the leaf at `index` against [`Self::root`].
    pub fn proof(&self, index: usize) -> Result<MerkleProof> {
        let tree_size = self.len();
        if index >= tree_size {
            return Err(LargePreimageError::IndexOutOfBounds {
                index,
                length: tree_size,
            });
        }

        let mut siblings = Vec::new();
        let mut current = index;
        let mut level = 0;

        while self.has_parent_level(level) {
            let layer = &self.layers[level];
            let sibling = current ^ 1;
            match layer.get(sibling) {
                Some(hash) => siblings.push(*hash),
                None => match self.policy {
                    OddNodePolicy::ZeroSubtree { .. } => siblings.push(zero_hash(level)),
                    OddNodePolicy::DuplicateLast => siblings.push(layer[current]),
                    OddNodePolicy::Carry => {}
                },
            }
            current /= 2;
            level += 1;
        }

        Ok(MerkleProof {
            index,
            tree_size,
            siblings,
        })
    }
}

/// Verifies that `leaf` sits at `proof.index` of a tree with root `root`.
///
/// The shape of the path is recomputed from `proof.tree_size`, so a proof
/// with missing or extra siblings never verifies.
pub fn verify_proof(root: B256, leaf: B256, proof: &MerkleProof, policy: OddNodePolicy) -> bool {
    if proof.index >= proof.tree_size {
        return false;
    }

    let mut siblings = proof.siblings.iter();
    let mut current = leaf;
    let mut index = proof.index;

    match policy {
        OddNodePolicy::ZeroSubtree { depth } => {
            if policy.capacity().map_or(true, |cap| proof.tree_size > cap) {
                return false;
            }
            for _ in 0..depth {
                let Some(sibling) = siblings.next() else {
                    return false;
                };
                current = if index % 2 == 1 {
                    hash_node(*sibling, current)
                } else {
                    hash_node(current, *sibling)
                };
                index /= 2;
            }
        }
        OddNodePolicy::DuplicateLast | OddNodePolicy::Carry => {
            let mut width = proof.tree_size;
            while width > 1 {
                let unpaired = index % 2 == 0 && index + 1 == width;
                if unpaired && policy == OddNodePolicy::Carry {
                    // promoted unchanged
                } else {
                    let Some(sibling) = siblings.next() else {
                        return false;
                    };
                    current = if index % 2 == 1 {
                        hash_node(*sibling, current)
                    } else {
                        hash_node(current, *sibling)
                    };
                }
                index /= 2;
                width = width.div_ceil(2);
            }
        }
    }

    siblings.next().is_none() && current == root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<B256> {
        (0..n).map(|i| keccak256((i as u64).to_be_bytes())).collect()
    }

    /// Reference root computed level by level without the incremental path.
    fn naive_root(policy: OddNodePolicy, leaves: &[B256]) -> B256 {
        let mut layer = leaves.to_vec();
        match policy {
            OddNodePolicy::ZeroSubtree { depth } => {
                for level in 0..depth {
                    layer = layer
                        .chunks(2)
                        .map(|p| hash_node(p[0], p.get(1).copied().unwrap_or(zero_hash(level))))
                        .collect();
                    if layer.is_empty() {
                        return zero_hash(depth);
                    }
                }
                layer[0]
            }
            _ => {
                if layer.is_empty() {
                    return B256::ZERO;
                }
                while layer.len() > 1 {
                    layer = layer
                        .chunks(2)
                        .map(|p| match (p.get(1), policy) {
                            (Some(r), _) => hash_node(p[0], *r),
                            (None, OddNodePolicy::Carry) => p[0],
                            (None, _) => hash_node(p[0], p[0]),
                        })
                        .collect();
                }
                layer[0]
            }
        }
    }

    const POLICIES: [OddNodePolicy; 3] = [
        OddNodePolicy::ZeroSubtree { depth: 4 },
        OddNodePolicy::DuplicateLast,
        OddNodePolicy::Carry,
    ];

    #[test]
    fn incremental_root_matches_naive() {
        for policy in POLICIES {
            for n in 0..=16 {
                let leaves = leaves(n);
                let tree = CommitmentTree::from_leaves(policy, &leaves).unwrap();
                assert_eq!(tree.root(), naive_root(policy, &leaves), "{:?} n={}", policy, n);
            }
        }
    }

    #[test]
    fn every_proof_verifies() {
        for policy in POLICIES {
            for n in 1..=16 {
                let leaves = leaves(n);
                let tree = CommitmentTree::from_leaves(policy, &leaves).unwrap();
                for (i, leaf) in leaves.iter().enumerate() {
                    let proof = tree.proof(i).unwrap();
                    assert!(
                        verify_proof(tree.root(), *leaf, &proof, policy),
                        "{:?} n={} i={}",
                        policy,
                        n,
                        i
                    );
                }
            }
        }
    }

    #[test]
    fn empty_zero_subtree_root() {
        let tree = CommitmentTree::new(OddNodePolicy::default());
        assert_eq!(tree.root(), zero_hash(16));
        assert_eq!(zero_hash(1), hash_node(B256::ZERO, B256::ZERO));
    }

    #[test]
    fn full_tree_rejects_append() {
        let policy = OddNodePolicy::ZeroSubtree { depth: 2 };
        let mut tree = CommitmentTree::from_leaves(policy, &leaves(4)).unwrap();
        let err = tree.append(B256::ZERO).unwrap_err();
        assert!(matches!(err, LargePreimageError::TreeFull { capacity: 4 }));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn proof_out_of_bounds() {
        let tree = CommitmentTree::from_leaves(OddNodePolicy::Carry, &leaves(3)).unwrap();
        assert!(matches!(
            tree.proof(3),
            Err(LargePreimageError::IndexOutOfBounds { index: 3, length: 3 })
        ));
    }

    #[test]
    fn single_leaf_dynamic_tree() {
        let leaf = leaves(1)[0];
        let tree = CommitmentTree::from_leaves(OddNodePolicy::DuplicateLast, &[leaf]).unwrap();
        assert_eq!(tree.root(), leaf);
        let proof = tree.proof(0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(verify_proof(tree.root(), leaf, &proof, OddNodePolicy::DuplicateLast));
    }
}
