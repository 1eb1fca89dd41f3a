//! Drives a preimage through the oracle's large preimage lifecycle.

use std::time::Instant;
use tracing::{debug, info, info_span, warn};

use super::claim::ClaimState;
use super::proof::{materialize, ProofTarget};
use super::types::{PreimageOracleData, UploadOutcome};
use crate::config::UploadConfig;
use crate::contract::{PreimageOracle, TxCandidate};
use crate::metrics::UploadMetrics;
use crate::registry::{ClaimKey, ClaimRegistry};
use crate::sender::TxSender;
use crate::utils::claim_uuid;
use crate::{LargePreimageError, Result};

/// Uploads preimages through an oracle binding and a transaction sender.
///
/// Each stage (init, every AddLeaves batch, squeeze) is sent on its own and
/// the claim only advances once the sender reports it accepted. Progress is
/// kept in a [`ClaimRegistry`], so calling `upload_preimage` again with the
/// same data after a failure picks up at the first unaccepted block.
pub struct UploadCoordinator<O, S> {
    config: UploadConfig,
    oracle: O,
    sender: S,
    registry: ClaimRegistry,
}

impl<O: PreimageOracle, S: TxSender> UploadCoordinator<O, S> {
    /// Creates a coordinator with an empty registry.
    pub fn new(config: UploadConfig, oracle: O, sender: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            oracle,
            sender,
            registry: ClaimRegistry::new(),
        })
    }

    /// Replaces the registry, e.g. with one loaded from disk.
    pub fn with_registry(mut self, registry: ClaimRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn registry(&self) -> &ClaimRegistry {
        &self.registry
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Uploads `data` as a large preimage claim owned by the sender's account.
    ///
    /// # Arguments
    ///
    /// * `claim_index` - Caller-side index of the claim, used for logging
    /// * `data` - The preimage and its part offset
    ///
    /// # Returns
    ///
    /// The transactions sent during this call and the finalization proof of
    /// the last block. A claim that is already finalized sends nothing.
    ///
    /// # Errors
    ///
    /// - `NilPreimageData` for empty data, before anything is sent
    /// - `External` with the sender's error, untouched; retrying resumes
    /// - any other error wrapped in `Claim { uuid, .. }`
    pub fn upload_preimage(
        &mut self,
        claim_index: u64,
        data: &PreimageOracleData,
    ) -> Result<UploadOutcome> {
        if data.is_empty() {
            return Err(LargePreimageError::NilPreimageData);
        }

        let started = Instant::now();
        let claimant = self.sender.from();
        let uuid = claim_uuid(claimant, &data.data, data.offset);
        let _span = info_span!("upload_preimage", claim_index, %uuid, size = data.data.len())
            .entered();

        let prepared = super::prepare_upload(claimant, data, &self.config)
            .map_err(|e| e.with_claim(uuid))?;
        let claim = prepared.claim;
        let total_blocks = prepared.block_count();

        let mut metrics = UploadMetrics {
            preimage_bytes: data.data.len(),
            blocks: total_blocks,
            prepare_duration: started.elapsed(),
            ..UploadMetrics::default()
        };
        let mut transactions = Vec::new();

        let key = ClaimKey::new(claimant, uuid);
        let mut progress = self.registry.progress(&key);
        if progress.state != ClaimState::Uninitialized && progress.total_blocks != total_blocks {
            return Err(LargePreimageError::InvalidInput(format!(
                "registry expects {} blocks, preimage has {}",
                progress.total_blocks, total_blocks
            ))
            .with_claim(uuid));
        }

        // 1. Open the claim
        if progress.state == ClaimState::Uninitialized {
            let tx = self
                .oracle
                .init_large_preimage(&claim)
                .map_err(|e| e.with_claim(uuid))?;
            self.submit(tx, &mut transactions, &mut metrics)?;
            progress.initialize(total_blocks).map_err(|e| e.with_claim(uuid))?;
            self.registry.update(key, progress.clone());
            debug!(claimed_size = claim.claimed_size, "claim initialized");
        } else {
            metrics.blocks_skipped = progress.blocks_accepted;
            warn!(
                state = %progress.state,
                blocks_accepted = progress.blocks_accepted,
                total_blocks,
                "resuming existing claim"
            );
        }

        // 2. Stream the remaining blocks
        if progress.state == ClaimState::Absorbing {
            let batches = prepared.batches(progress.blocks_accepted, self.config.max_blocks_per_batch);
            for batch in batches {
                let tx = self
                    .oracle
                    .add_leaves(&claim, &batch)
                    .map_err(|e| e.with_claim(uuid))?;
                self.submit(tx, &mut transactions, &mut metrics)?;
                progress
                    .accept_batch(batch.first_block, batch.len(), batch.input.len(), batch.finalize)
                    .map_err(|e| e.with_claim(uuid))?;
                self.registry.update(key, progress.clone());
                metrics.batches_sent += 1;
                debug!(
                    first_block = batch.first_block,
                    blocks = batch.len(),
                    finalize = batch.finalize,
                    "leaves accepted"
                );
            }
        }

        // 3. Close it with a proof of the last transition
        let proof = materialize(
            &prepared.tree,
            &prepared.leaves,
            self.config.rate,
            ProofTarget::Last,
        )
        .map_err(|e| e.with_claim(uuid))?;

        if progress.state == ClaimState::ReadyToSqueeze {
            let tx = self
                .oracle
                .squeeze(claimant, &claim, &proof)
                .map_err(|e| e.with_claim(uuid))?;
            self.submit(tx, &mut transactions, &mut metrics)?;
            progress.finalize().map_err(|e| e.with_claim(uuid))?;
            self.registry.update(key, progress);
            debug!(root = %proof.root, "claim squeezed");
        }

        metrics.total_duration = started.elapsed();
        info!(
            transactions = transactions.len(),
            batches = metrics.batches_sent,
            digest = %prepared.digest(),
            "upload complete"
        );

        Ok(UploadOutcome {
            claim_index,
            claim,
            transactions,
            proof,
            metrics,
        })
    }

    /// Hands one stage to the sender. Sender errors pass through as `External`.
    fn submit(
        &self,
        tx: TxCandidate,
        transactions: &mut Vec<TxCandidate>,
        metrics: &mut UploadMetrics,
    ) -> Result<()> {
        self.sender
            .send(std::slice::from_ref(&tx))
            .map_err(LargePreimageError::External)?;
        metrics.transactions += 1;
        metrics.calldata_bytes += tx.calldata().len();
        transactions.push(tx);
        Ok(())
    }
}
