//! High-level assertion helpers for common test patterns.

#![allow(dead_code)]
//!
//! These decode the recorded transactions back into typed oracle calls so
//! tests can assert on what the contract would actually receive.

use alloy_primitives::U256;
use large_preimage::{
    api::UploadOutcome,
    contract::bindings::{addLeavesLPPCall, initLPPCall, squeezeLPPCall},
    TxCandidate, UploadConfig,
};

/// Asserts the oracle methods targeted by `txs`, in order.
pub fn assert_methods(txs: &[TxCandidate], expected: &[&str]) {
    let methods: Vec<&str> = txs.iter().map(TxCandidate::method).collect();
    assert_eq!(methods, expected, "unexpected transaction sequence");
}

/// Decodes every AddLeaves call in `txs`.
pub fn add_leaves_calls(txs: &[TxCandidate]) -> Vec<addLeavesLPPCall> {
    txs.iter()
        .filter(|tx| tx.method() == "addLeavesLPP")
        .map(|tx| tx.decode().expect("AddLeaves should decode"))
        .collect()
}

/// Decodes the single InitLargePreimage call in `txs`.
pub fn init_call(txs: &[TxCandidate]) -> initLPPCall {
    let inits: Vec<_> = txs.iter().filter(|tx| tx.method() == "initLPP").collect();
    assert_eq!(inits.len(), 1, "expected exactly one initLPP");
    inits[0].decode().expect("initLPP should decode")
}

/// Decodes the single Squeeze call in `txs`.
pub fn squeeze_call(txs: &[TxCandidate]) -> squeezeLPPCall {
    let squeezes: Vec<_> = txs.iter().filter(|tx| tx.method() == "squeezeLPP").collect();
    assert_eq!(squeezes.len(), 1, "expected exactly one squeezeLPP");
    squeezes[0].decode().expect("squeezeLPP should decode")
}

/// Asserts that the outcome's proof verifies and matches its squeeze call.
pub fn assert_outcome_consistent(outcome: &UploadOutcome, config: &UploadConfig) {
    outcome
        .proof
        .verify(config.odd_node)
        .expect("finalization proof should verify");

    for tx in &outcome.transactions {
        assert_eq!(tx.to, config.oracle);
        assert_eq!(tx.value, U256::ZERO);
    }

    if outcome.transactions.iter().any(|tx| tx.method() == "squeezeLPP") {
        let squeeze = squeeze_call(&outcome.transactions);
        assert_eq!(squeeze.uuid, outcome.claim.uuid);
        assert_eq!(squeeze.claimant, outcome.claim.owner);
        assert_eq!(&squeeze.stateMatrix.state, outcome.proof.prestate_matrix.lanes());
        assert_eq!(
            squeeze.postState.index,
            U256::from(outcome.proof.target.leaf.index)
        );
        assert_eq!(squeeze.postStateProof, outcome.proof.target.proof.siblings);
    }
}
