//! Centralized configuration for the large preimage engine.
//!
//! This module contains constants and default parameters used throughout the
//! crate, plus [`UploadConfig`], the injected per-deployment settings: sponge
//! rate, padding rule, odd-node tree convention and the AddLeaves batch ceiling.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{LargePreimageError, Result};

// --- Sponge Parameters ---

/// Width of the keccak-f[1600] state in bytes.
pub const KECCAK_STATE_BYTES: usize = 200;

/// Number of 64-bit lanes in the keccak state.
pub const KECCAK_STATE_LANES: usize = 25;

/// Absorption rate of keccak256 in bytes (1088 bits).
pub const KECCAK_RATE: usize = 136;

/// Domain separation byte of the original keccak padding (pad10*1).
pub const KECCAK_DOMAIN: u8 = 0x01;

/// Domain separation byte of FIPS-202 SHA3.
pub const SHA3_DOMAIN: u8 = 0x06;

/// Length in bytes of the ABI-encoded `uint64[25]` state snapshot.
pub const STATE_SNAPSHOT_BYTES: usize = KECCAK_STATE_LANES * 32;

// --- Commitment Tree Parameters ---

/// Depth of the oracle's fixed-size leaf tree.
pub const KECCAK_TREE_DEPTH: usize = 16;

// --- Transport Parameters ---

/// Default number of blocks carried by a single AddLeaves call.
pub const MAX_BLOCKS_PER_BATCH: usize = 300;

// --- Registry I/O Constants ---

/// Maximum size for serialized claim registries (16 MB)
pub const MAX_REGISTRY_SIZE_BYTES: usize = 16 * 1024 * 1024;

/// Current registry format version
pub const REGISTRY_FORMAT_VERSION: u16 = 1;

// --- Test-related Constants ---

/// A fixed random seed used in tests and the CLI demo data generator.
pub const TEST_RANDOM_SEED: u64 = 42;

// --- Benchmark Parameters ---

/// Seed for benchmark preimages.
pub const BENCHMARK_SEED: u64 = 7;

/// Iterations averaged for single-permutation timings.
pub const BENCHMARK_ABSORB_ITERATIONS: usize = 10_000;

/// Leaves appended when timing the commitment tree.
pub const BENCHMARK_TREE_LEAVES: usize = 4096;

/// Iterations averaged for proof generation and verification timings.
pub const BENCHMARK_PROOF_ITERATIONS: usize = 1000;

/// Preimage sizes (KB) used by the prepare and upload benchmarks.
pub const BENCHMARK_PREIMAGE_SIZES_KB: [usize; 3] = [16, 256, 2048];

/// Domain-separated multi-rate padding.
///
/// The first padding byte is `domain`, the last byte of the block is OR-ed
/// with `0x80`. When only one padding byte fits, both land on the same byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddingRule {
    pub domain: u8,
}

impl PaddingRule {
    /// Original keccak padding, as used by `keccak256` and the EVM.
    pub const KECCAK: Self = Self {
        domain: KECCAK_DOMAIN,
    };

    /// FIPS-202 SHA3 padding.
    pub const SHA3: Self = Self {
        domain: SHA3_DOMAIN,
    };

    /// Pads `data` (shorter than `rate`) into a full `rate`-byte block.
    pub fn pad(&self, data: &[u8], rate: usize) -> Vec<u8> {
        debug_assert!(data.len() < rate);
        let mut block = vec![0u8; rate];
        block[..data.len()].copy_from_slice(data);
        block[data.len()] ^= self.domain;
        block[rate - 1] ^= 0x80;
        block
    }
}

impl Default for PaddingRule {
    fn default() -> Self {
        Self::KECCAK
    }
}

/// How a level with an odd number of nodes is closed off.
///
/// Must match the verifying contract bit-for-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OddNodePolicy {
    /// Fixed-depth tree, missing nodes are canonical zero-subtree hashes.
    ZeroSubtree { depth: usize },
    /// An unpaired node is hashed with itself.
    DuplicateLast,
    /// An unpaired node is promoted to the next level unchanged.
    Carry,
}

impl OddNodePolicy {
    /// Leaf capacity of the tree, if bounded.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::ZeroSubtree { depth } => 1usize.checked_shl(*depth as u32),
            Self::DuplicateLast | Self::Carry => None,
        }
    }
}

impl Default for OddNodePolicy {
    fn default() -> Self {
        Self::ZeroSubtree {
            depth: KECCAK_TREE_DEPTH,
        }
    }
}

/// Injected settings for a deployment of the preimage oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Sponge absorption rate in bytes.
    pub rate: usize,
    /// Padding applied to the terminal block.
    pub padding: PaddingRule,
    /// Odd-node convention of the commitment tree.
    pub odd_node: OddNodePolicy,
    /// Ceiling on blocks per AddLeaves call, set by transport limits.
    pub max_blocks_per_batch: usize,
    /// Address of the preimage oracle contract.
    pub oracle: Address,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            rate: KECCAK_RATE,
            padding: PaddingRule::KECCAK,
            odd_node: OddNodePolicy::default(),
            max_blocks_per_batch: MAX_BLOCKS_PER_BATCH,
            oracle: Address::ZERO,
        }
    }
}

impl UploadConfig {
    /// Default settings targeting the oracle at `oracle`.
    pub fn for_oracle(oracle: Address) -> Self {
        Self {
            oracle,
            ..Self::default()
        }
    }

    /// Rejects settings the sponge or the tree cannot honour.
    pub fn validate(&self) -> Result<()> {
        validate_rate(self.rate)?;
        if self.max_blocks_per_batch == 0 {
            return Err(LargePreimageError::Config(
                "max_blocks_per_batch must be at least 1".to_string(),
            ));
        }
        if self.padding.domain & 0x80 != 0 {
            return Err(LargePreimageError::Config(format!(
                "padding domain byte {:#04x} collides with the final pad bit",
                self.padding.domain
            )));
        }
        if let OddNodePolicy::ZeroSubtree { depth } = self.odd_node {
            if depth == 0 || depth >= usize::BITS as usize {
                return Err(LargePreimageError::Config(format!(
                    "zero-subtree depth {} out of range",
                    depth
                )));
            }
        }
        Ok(())
    }

    /// Loads a JSON config file; missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LargePreimageError::IO(format!(
                "Failed to read config from {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: UploadConfig = serde_json::from_str(&raw).map_err(|e| {
            LargePreimageError::Serialization(format!("Failed to parse config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Checks that `rate` is usable with a 1600-bit keccak state.
pub fn validate_rate(rate: usize) -> Result<()> {
    if rate == 0 || rate % 8 != 0 || rate >= KECCAK_STATE_BYTES {
        return Err(LargePreimageError::InvalidRate {
            rate,
            max: KECCAK_STATE_BYTES,
        });
    }
    Ok(())
}
