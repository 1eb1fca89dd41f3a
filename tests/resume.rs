//! Tests for resuming interrupted uploads.
//!
//! A sender failure leaves the claim at the last accepted stage; the next
//! call must continue from there without re-sending accepted blocks, whether
//! the progress lives in the same coordinator or in a reloaded registry.

use large_preimage::{
    api::{ClaimProgress, ClaimState},
    ClaimKey, ClaimRegistry, ErrorKind, LargePreimageError,
};

mod common;

use common::assertions::{add_leaves_calls, assert_methods, assert_outcome_consistent};
use common::fixtures::{random_preimage, UploadSetup, CLAIMANT};

#[test]
fn test_resume_after_failed_batch() {
    // calls: 0 init, 1 batch [0,3), 2 batch [3,6) fails
    let setup = UploadSetup::with_batch_limit(3);
    setup.sender.fail_on_call(2);
    let mut coordinator = setup.coordinator();
    let data = random_preimage(1000);

    let err = coordinator.upload_preimage(0, &data).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalFailure);
    assert!(err.is_retryable());
    assert_methods(&setup.sender.sent(), &["initLPP", "addLeavesLPP"]);

    let uuid = large_preimage::claim_uuid(CLAIMANT, &data.data, 0);
    let progress = coordinator.registry().progress(&ClaimKey::new(CLAIMANT, uuid));
    assert_eq!(progress.state, ClaimState::Absorbing);
    assert_eq!(progress.blocks_accepted, 3);
    assert_eq!(progress.bytes_accepted, 3 * 136);

    let outcome = coordinator.upload_preimage(0, &data).unwrap();
    assert_methods(
        &outcome.transactions,
        &["addLeavesLPP", "addLeavesLPP", "squeezeLPP"],
    );
    assert_eq!(outcome.metrics.blocks_skipped, 3);
    assert_outcome_consistent(&outcome, &setup.config);

    // across both calls every block was sent exactly once
    let all = setup.sender.sent();
    assert_methods(
        &all,
        &["initLPP", "addLeavesLPP", "addLeavesLPP", "addLeavesLPP", "squeezeLPP"],
    );
    let streamed: Vec<u8> = add_leaves_calls(&all)
        .iter()
        .flat_map(|b| b.input.to_vec())
        .collect();
    assert_eq!(streamed, data.data);
}

#[test]
fn test_resume_after_failed_init() {
    let setup = UploadSetup::default();
    setup.sender.fail_on_call(0);
    let mut coordinator = setup.coordinator();
    let data = random_preimage(400);

    assert!(coordinator.upload_preimage(0, &data).is_err());
    assert!(setup.sender.sent().is_empty());
    assert!(coordinator.registry().is_empty());

    let outcome = coordinator.upload_preimage(0, &data).unwrap();
    assert_methods(
        &outcome.transactions,
        &["initLPP", "addLeavesLPP", "squeezeLPP"],
    );
}

#[test]
fn test_resume_after_failed_squeeze() {
    // calls: 0 init, 1..=4 batches, 5 squeeze fails
    let setup = UploadSetup::with_batch_limit(2);
    setup.sender.fail_on_call(5);
    let mut coordinator = setup.coordinator();
    let data = random_preimage(1000);

    let err = coordinator.upload_preimage(0, &data).unwrap_err();
    assert!(matches!(err, LargePreimageError::External(_)));

    let uuid = large_preimage::claim_uuid(CLAIMANT, &data.data, 0);
    let key = ClaimKey::new(CLAIMANT, uuid);
    assert_eq!(
        coordinator.registry().progress(&key).state,
        ClaimState::ReadyToSqueeze
    );

    let outcome = coordinator.upload_preimage(0, &data).unwrap();
    assert_methods(&outcome.transactions, &["squeezeLPP"]);
    assert_eq!(coordinator.registry().progress(&key).state, ClaimState::Finalized);
    assert_outcome_consistent(&outcome, &setup.config);
}

#[test]
fn test_resume_from_saved_registry() {
    let temp_path = std::env::temp_dir().join("test_large_preimage_registry.bin");
    let data = random_preimage(1000);

    // First process: dies after the first batch
    let setup = UploadSetup::with_batch_limit(3);
    setup.sender.fail_on_call(2);
    let mut first = setup.coordinator();
    assert!(first.upload_preimage(0, &data).is_err());
    first.registry().save(&temp_path).unwrap();

    // Second process: fresh coordinator and sender, reloaded registry
    let resumed = UploadSetup::with_batch_limit(3);
    let registry = ClaimRegistry::load(&temp_path).unwrap();
    assert_eq!(&registry, first.registry());
    let mut second = resumed.coordinator().with_registry(registry);

    let outcome = second.upload_preimage(0, &data).unwrap();
    assert_methods(
        &outcome.transactions,
        &["addLeavesLPP", "addLeavesLPP", "squeezeLPP"],
    );
    assert_eq!(add_leaves_calls(&outcome.transactions)[0].input.len(), 3 * 136);
    assert_outcome_consistent(&outcome, &resumed.config);

    std::fs::remove_file(&temp_path).ok();
}

#[test]
fn test_registry_rejects_tampered_file() {
    let temp_path = std::env::temp_dir().join("test_large_preimage_tampered.bin");

    let mut registry = ClaimRegistry::new();
    registry.update(
        ClaimKey::new(CLAIMANT, alloy_primitives::U256::from(1u64)),
        ClaimProgress {
            state: ClaimState::Absorbing,
            total_blocks: 8,
            blocks_accepted: 3,
            bytes_accepted: 408,
        },
    );
    registry.save(&temp_path).unwrap();

    let mut bytes = std::fs::read(&temp_path).unwrap();
    // bump the format version
    bytes[0] ^= 0xff;
    std::fs::write(&temp_path, &bytes).unwrap();

    let err = ClaimRegistry::load(&temp_path).unwrap_err();
    assert!(err.to_string().contains("format version"));

    std::fs::remove_file(&temp_path).ok();
    assert!(ClaimRegistry::load(&temp_path).is_err());
}

#[test]
fn test_mismatched_registry_entry_rejected() {
    let setup = UploadSetup::default();
    let data = random_preimage(1000);
    let uuid = large_preimage::claim_uuid(CLAIMANT, &data.data, 0);

    let mut registry = ClaimRegistry::new();
    registry.update(
        ClaimKey::new(CLAIMANT, uuid),
        ClaimProgress {
            state: ClaimState::Absorbing,
            total_blocks: 5,
            blocks_accepted: 1,
            bytes_accepted: 136,
        },
    );
    let mut coordinator = setup.coordinator().with_registry(registry);

    let err = coordinator.upload_preimage(0, &data).unwrap_err();
    assert!(matches!(err, LargePreimageError::Claim { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(setup.sender.sent().is_empty());
}
