//! Preimage oracle contract surface.
//!
//! [`PreimageOracle`] is the capability set the uploader needs:
//! `{InitLargePreimage, AddLeaves, Squeeze}`, each turning domain values into
//! a [`TxCandidate`]. [`AbiOracleBinding`] is the stock adapter that packs
//! the calls with the oracle's Solidity ABI; anything else that produces
//! candidates (a mock, a different encoding) can be dropped in instead.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::api::{Claim, FinalizationProof, InputBatch, LeafRecord};
use crate::config::{KECCAK_STATE_LANES, STATE_SNAPSHOT_BYTES};
use crate::matrix::StateMatrix;
use crate::merkle::MerkleProof;
use crate::{LargePreimageError, Result};

/// Solidity bindings of the oracle's large preimage entry points.
pub mod bindings {
    use alloy_sol_types::sol;

    sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct StateMatrix {
            uint64[25] state;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Leaf {
            bytes input;
            uint256 index;
            bytes32 stateCommitment;
        }

        #[derive(Debug, PartialEq, Eq)]
        function initLPP(uint256 uuid, uint32 partOffset, uint32 claimedSize) external payable;

        #[derive(Debug, PartialEq, Eq)]
        function addLeavesLPP(uint256 uuid, bytes input, bytes32[] stateCommitments, bool finalize) external;

        #[derive(Debug, PartialEq, Eq)]
        function squeezeLPP(
            address claimant,
            uint256 uuid,
            StateMatrix stateMatrix,
            Leaf preState,
            bytes32[] preStateProof,
            Leaf postState,
            bytes32[] postStateProof
        ) external;
    }
}

/// A transaction for the external sender to sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCandidate {
    /// Contract the call targets.
    pub to: Address,
    /// Wei attached to the call; always zero for the uploader.
    pub value: U256,
    /// Four-byte function selector.
    pub selector: [u8; 4],
    /// ABI-encoded arguments, without the selector.
    pub encoded_args: Bytes,
}

impl TxCandidate {
    /// Packs a typed call for `to`.
    pub fn from_call<C: SolCall>(to: Address, call: &C) -> Self {
        let encoded = call.abi_encode();
        Self {
            to,
            value: U256::ZERO,
            selector: C::SELECTOR,
            encoded_args: Bytes::copy_from_slice(&encoded[4..]),
        }
    }

    /// Selector followed by the encoded arguments.
    pub fn calldata(&self) -> Bytes {
        let mut out = Vec::with_capacity(4 + self.encoded_args.len());
        out.extend_from_slice(&self.selector);
        out.extend_from_slice(&self.encoded_args);
        out.into()
    }

    /// Decodes the candidate back into a typed call, checking the selector.
    pub fn decode<C: SolCall>(&self) -> Result<C> {
        if self.selector != C::SELECTOR {
            return Err(LargePreimageError::Encoding {
                call: C::SIGNATURE,
                details: format!("selector {:02x?} does not match", self.selector),
            });
        }
        C::abi_decode(&self.calldata()).map_err(|e| LargePreimageError::Encoding {
            call: C::SIGNATURE,
            details: e.to_string(),
        })
    }

    /// Human-readable name of the targeted oracle entry point.
    pub fn method(&self) -> &'static str {
        match self.selector {
            s if s == bindings::initLPPCall::SELECTOR => "initLPP",
            s if s == bindings::addLeavesLPPCall::SELECTOR => "addLeavesLPP",
            s if s == bindings::squeezeLPPCall::SELECTOR => "squeezeLPP",
            _ => "unknown",
        }
    }
}

/// The oracle calls the uploader issues.
pub trait PreimageOracle {
    /// Address the candidates target.
    fn address(&self) -> Address;

    fn init_large_preimage(&self, claim: &Claim) -> Result<TxCandidate>;

    fn add_leaves(&self, claim: &Claim, batch: &InputBatch) -> Result<TxCandidate>;

    fn squeeze(
        &self,
        claimant: Address,
        claim: &Claim,
        proof: &FinalizationProof,
    ) -> Result<TxCandidate>;
}

/// Packs oracle calls with the Solidity ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiOracleBinding {
    address: Address,
    rate: usize,
}

impl AbiOracleBinding {
    /// Binding for the oracle at `address` absorbing `rate`-byte leaves.
    pub fn new(address: Address, rate: usize) -> Self {
        Self { address, rate }
    }

    fn sol_leaf(&self, leaf: &LeafRecord) -> Result<bindings::Leaf> {
        if leaf.input.len() != self.rate {
            return Err(LargePreimageError::Encoding {
                call: bindings::squeezeLPPCall::SIGNATURE,
                details: format!(
                    "leaf {} input is {} bytes, oracle expects {}",
                    leaf.index,
                    leaf.input.len(),
                    self.rate
                ),
            });
        }
        Ok(bindings::Leaf {
            input: Bytes::copy_from_slice(&leaf.input),
            index: U256::from(leaf.index),
            stateCommitment: leaf.commitment(),
        })
    }

    fn sol_matrix(matrix: &StateMatrix) -> bindings::StateMatrix {
        let mut state = [0u64; KECCAK_STATE_LANES];
        state.copy_from_slice(matrix.lanes());
        bindings::StateMatrix { state }
    }
}

fn proof_words(proof: &MerkleProof) -> Vec<B256> {
    proof.siblings.clone()
}

impl PreimageOracle for AbiOracleBinding {
    fn address(&self) -> Address {
        self.address
    }

    fn init_large_preimage(&self, claim: &Claim) -> Result<TxCandidate> {
        if claim.claimed_size == 0 {
            return Err(LargePreimageError::InvalidInput(
                "claimed size must be non-zero".to_string(),
            ));
        }
        let call = bindings::initLPPCall {
            uuid: claim.uuid,
            partOffset: claim.part_offset,
            claimedSize: claim.claimed_size,
        };
        Ok(TxCandidate::from_call(self.address, &call))
    }

    fn add_leaves(&self, claim: &Claim, batch: &InputBatch) -> Result<TxCandidate> {
        let max_input = batch.len() * self.rate;
        if batch.is_empty() || batch.input.len() > max_input {
            return Err(LargePreimageError::Encoding {
                call: bindings::addLeavesLPPCall::SIGNATURE,
                details: format!(
                    "{} input bytes for {} commitments at block {}",
                    batch.input.len(),
                    batch.len(),
                    batch.first_block
                ),
            });
        }
        let call = bindings::addLeavesLPPCall {
            uuid: claim.uuid,
            input: Bytes::copy_from_slice(&batch.input),
            stateCommitments: batch.commitments.clone(),
            finalize: batch.finalize,
        };
        Ok(TxCandidate::from_call(self.address, &call))
    }

    fn squeeze(
        &self,
        claimant: Address,
        claim: &Claim,
        proof: &FinalizationProof,
    ) -> Result<TxCandidate> {
        let (pre_state, pre_proof) = match &proof.preceding {
            Some(pre) => (self.sol_leaf(&pre.leaf)?, proof_words(&pre.proof)),
            None => (
                bindings::Leaf {
                    input: Bytes::new(),
                    index: U256::ZERO,
                    stateCommitment: B256::ZERO,
                },
                Vec::new(),
            ),
        };

        let call = bindings::squeezeLPPCall {
            claimant,
            uuid: claim.uuid,
            stateMatrix: Self::sol_matrix(&proof.prestate_matrix),
            preState: pre_state,
            preStateProof: pre_proof,
            postState: self.sol_leaf(&proof.target.leaf)?,
            postStateProof: proof_words(&proof.target.proof),
        };
        let candidate = TxCandidate::from_call(self.address, &call);

        // the packed matrix sits inline right after claimant and uuid
        let packed = &candidate.encoded_args[64..64 + STATE_SNAPSHOT_BYTES];
        if packed != proof.prestate_matrix.snapshot().as_slice() {
            return Err(LargePreimageError::Encoding {
                call: bindings::squeezeLPPCall::SIGNATURE,
                details: "state matrix packing diverges from snapshot layout".to_string(),
            });
        }

        Ok(candidate)
    }
}
