//! Large preimage upload engine
//!
//! This library prepares and uploads keccak256 preimages that are too large
//! to post to a preimage oracle in one transaction. The preimage is absorbed
//! block by block, every intermediate sponge state is committed to, and the
//! commitments are collected in a Merkle tree so a single block transition
//! can later be checked on-chain without re-hashing the whole preimage.
//!
//! ## Main Components
//!
//! - [`api`]: Upload preparation, the upload coordinator and finalization proofs
//! - [`chunker`]: Splitting preimages into padded sponge blocks
//! - [`matrix`]: Incremental keccak-f[1600] state with oracle-compatible snapshots
//! - [`merkle`]: Append-only keccak commitment tree with pluggable odd-node handling
//! - [`contract`]: Oracle ABI bindings and transaction candidates
//! - [`sender`]: The transaction-sending seam
//! - [`registry`]: Persistent per-claim progress
//! - [`config`]: Centralized configuration constants
//!
//! ## Error Handling
//!
//! Core functions return `Result<T, LargePreimageError>`. Errors are grouped
//! by [`ErrorKind`]; only failures reported by the transaction sender are
//! retryable:
//!
//! - `prepare_upload()` returns `Result<PreparedUpload, LargePreimageError>`
//! - `UploadCoordinator::upload_preimage()` returns `Result<UploadOutcome, LargePreimageError>`
//! - `materialize()` returns `Result<FinalizationProof, LargePreimageError>`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alloy_primitives::{keccak256, Address};
//! use large_preimage::{api, LargePreimageError, UploadConfig};
//!
//! // 1. Prepare the preimage: blocks, chained leaves and the commitment tree
//! let data = api::PreimageOracleData::new(vec![0xab; 1000], 0);
//! let config = UploadConfig::default();
//! let prepared = api::prepare_upload(Address::repeat_byte(1), &data, &config)?;
//! assert_eq!(prepared.block_count(), 8);
//! assert_eq!(prepared.digest(), keccak256(&data.data));
//!
//! // 2. Materialize and check the proof of the last block
//! let proof = api::materialize(
//!     &prepared.tree,
//!     &prepared.leaves,
//!     config.rate,
//!     api::ProofTarget::Last,
//! )?;
//! proof.verify(config.odd_node)?;
//! # Ok::<(), LargePreimageError>(())
//! ```

pub mod api;
pub mod chunker;
pub mod config;
pub mod contract;
pub mod error;
pub mod matrix;
pub mod merkle;
pub mod metrics;
pub mod registry;
pub mod sender;
pub mod utils;

// Re-export commonly used types and functions for convenience
pub use api::{
    materialize, prepare_upload, Claim, FinalizationProof, PreimageOracleData, PreparedUpload,
    ProofTarget, UploadCoordinator, UploadOutcome,
};
pub use config::{OddNodePolicy, PaddingRule, UploadConfig};
pub use contract::{AbiOracleBinding, PreimageOracle, TxCandidate};
pub use error::{ErrorKind, LargePreimageError, Result};
pub use matrix::StateMatrix;
pub use merkle::{verify_proof, CommitmentTree, MerkleProof};
pub use registry::{ClaimKey, ClaimRegistry};
pub use sender::{RecordingSender, TxSender};
pub use utils::{claim_uuid, keccak_preimage_key};
