//! Claim registry: the uploader's record of what the oracle has accepted.
//!
//! The registry maps `(owner, uuid)` to [`ClaimProgress`]. It stands in for
//! the oracle's per-claim metadata, so a restarted uploader knows where to
//! resume without re-sending accepted batches.
//!
//! ## Ordering
//!
//! Entries live in a `BTreeMap`, so iteration and the persisted form are
//! ordered by owner and then uuid, independently of insertion order.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::api::{ClaimProgress, ClaimState};
use crate::config::{MAX_REGISTRY_SIZE_BYTES, REGISTRY_FORMAT_VERSION};
use crate::{LargePreimageError, Result};

/// Key under which the oracle tracks a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClaimKey {
    pub owner: Address,
    pub uuid: U256,
}

impl ClaimKey {
    pub fn new(owner: Address, uuid: U256) -> Self {
        Self { owner, uuid }
    }
}

/// In-memory claim progress, persisted with bincode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimRegistry {
    claims: BTreeMap<ClaimKey, ClaimProgress>,
}

/// A serializable representation of the registry for persistence.
#[derive(Serialize, Deserialize)]
struct RegistryData {
    version: u16,
    claims: Vec<(ClaimKey, ClaimProgress)>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress of a claim; unknown claims are `Uninitialized`.
    pub fn progress(&self, key: &ClaimKey) -> ClaimProgress {
        self.claims.get(key).cloned().unwrap_or_default()
    }

    pub fn get(&self, key: &ClaimKey) -> Option<&ClaimProgress> {
        self.claims.get(key)
    }

    /// Records `progress` for `key`, replacing what was there.
    pub fn update(&mut self, key: ClaimKey, progress: ClaimProgress) {
        self.claims.insert(key, progress);
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Claims owned by `owner`, in uuid order.
    pub fn claims_of(&self, owner: Address) -> impl Iterator<Item = (&U256, &ClaimProgress)> {
        self.claims
            .iter()
            .filter(move |(key, _)| key.owner == owner)
            .map(|(key, progress)| (&key.uuid, progress))
    }

    /// Saves the registry to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = RegistryData {
            version: REGISTRY_FORMAT_VERSION,
            claims: self
                .claims
                .iter()
                .map(|(key, progress)| (*key, progress.clone()))
                .collect(),
        };

        let encoded = bincode::serialize(&data).map_err(|e| {
            LargePreimageError::Serialization(format!("Failed to serialize registry: {}", e))
        })?;

        if encoded.len() > MAX_REGISTRY_SIZE_BYTES {
            return Err(LargePreimageError::InvalidInput(format!(
                "Serialized registry size {} bytes exceeds maximum {} bytes",
                encoded.len(),
                MAX_REGISTRY_SIZE_BYTES
            )));
        }

        fs::write(path, encoded).map_err(|e| {
            LargePreimageError::IO(format!(
                "Failed to write registry to {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Loads a `ClaimRegistry` from the specified path with validation.
    pub fn load(path: &Path) -> Result<Self> {
        let encoded = fs::read(path).map_err(|e| {
            LargePreimageError::IO(format!(
                "Failed to read registry from {}: {}",
                path.display(),
                e
            ))
        })?;

        if encoded.len() > MAX_REGISTRY_SIZE_BYTES {
            return Err(LargePreimageError::InvalidInput(format!(
                "Registry file size {} bytes exceeds maximum {} bytes",
                encoded.len(),
                MAX_REGISTRY_SIZE_BYTES
            )));
        }

        let data: RegistryData = bincode::deserialize(&encoded).map_err(|e| {
            LargePreimageError::Serialization(format!("Failed to deserialize registry: {}", e))
        })?;

        if data.version != REGISTRY_FORMAT_VERSION {
            return Err(LargePreimageError::InvalidInput(format!(
                "Registry format version {} is not compatible with current version {}",
                data.version, REGISTRY_FORMAT_VERSION
            )));
        }

        let mut claims = BTreeMap::new();
        for (key, progress) in data.claims {
            validate_progress(&key, &progress)?;
            if claims.insert(key, progress).is_some() {
                return Err(LargePreimageError::InvalidInput(format!(
                    "Registry lists claim {} of {} twice",
                    key.uuid, key.owner
                )));
            }
        }

        Ok(Self { claims })
    }
}

/// Rejects progress records no sequence of accepted stages could produce.
fn validate_progress(key: &ClaimKey, progress: &ClaimProgress) -> Result<()> {
    let consistent = match progress.state {
        ClaimState::Uninitialized => progress.total_blocks == 0 && progress.blocks_accepted == 0,
        ClaimState::Absorbing => progress.blocks_accepted < progress.total_blocks,
        ClaimState::ReadyToSqueeze | ClaimState::Finalized => {
            progress.total_blocks > 0 && progress.blocks_accepted == progress.total_blocks
        }
    };
    if !consistent {
        return Err(LargePreimageError::InvalidInput(format!(
            "Registry entry for claim {} is inconsistent: {} with {}/{} blocks",
            key.uuid, progress.state, progress.blocks_accepted, progress.total_blocks
        )));
    }
    Ok(())
}
