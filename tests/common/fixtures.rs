//! Test fixtures and scenario configuration.
//!
//! This module provides seeded preimage generation and the `UploadSetup`
//! struct bundling a config, an oracle binding and a recording sender.

#![allow(dead_code)]

use alloy_primitives::Address;
use large_preimage::{
    api::{PreimageOracleData, UploadCoordinator},
    config::TEST_RANDOM_SEED,
    AbiOracleBinding, RecordingSender, UploadConfig,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Oracle address used throughout the tests.
pub const ORACLE: Address = Address::new([0xaa; 20]);

/// Claimant used throughout the tests.
pub const CLAIMANT: Address = Address::new([0x01; 20]);

/// Deterministic random bytes of length `size`, seeded by `seed`.
pub fn seeded_bytes(size: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; size];
    rng.fill_bytes(&mut data);
    data
}

/// A preimage of `size` random bytes at offset 0.
pub fn random_preimage(size: usize) -> PreimageOracleData {
    PreimageOracleData::new(seeded_bytes(size, TEST_RANDOM_SEED), 0)
}

/// Everything needed to run uploads against a recording sender.
pub struct UploadSetup {
    pub config: UploadConfig,
    pub sender: RecordingSender,
}

impl UploadSetup {
    /// Default config with the given batch ceiling.
    pub fn with_batch_limit(max_blocks_per_batch: usize) -> Self {
        let config = UploadConfig {
            max_blocks_per_batch,
            ..UploadConfig::for_oracle(ORACLE)
        };
        Self::with_config(config)
    }

    pub fn with_config(config: UploadConfig) -> Self {
        Self {
            config,
            sender: RecordingSender::new(CLAIMANT),
        }
    }

    /// A coordinator borrowing this setup's sender.
    pub fn coordinator(&self) -> UploadCoordinator<AbiOracleBinding, &RecordingSender> {
        let oracle = AbiOracleBinding::new(self.config.oracle, self.config.rate);
        UploadCoordinator::new(self.config.clone(), oracle, &self.sender)
            .expect("test config should be valid")
    }
}

impl Default for UploadSetup {
    fn default() -> Self {
        Self::with_config(UploadConfig::for_oracle(ORACLE))
    }
}
