//! Error types for the large preimage engine

use alloy_primitives::{B256, U256};

/// Coarse classification of a [`LargePreimageError`].
///
/// Only [`ErrorKind::ExternalFailure`] is worth retrying with identical input;
/// everything else is deterministic and will fail again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nil/empty preimage, zero claimed size, bad configuration.
    InvalidInput,
    /// Argument packing does not fit the oracle's expected signature.
    EncodingFailure,
    /// Chaining mismatch, tree-size mismatch, illegal claim transition.
    InvariantViolation,
    /// Error returned by the transaction-management collaborator.
    ExternalFailure,
}

/// Error types for the large preimage engine
#[derive(Debug, thiserror::Error)]
pub enum LargePreimageError {
    /// The preimage passed to the uploader was nil or empty
    #[error("cannot upload nil preimage data")]
    NilPreimageData,

    /// Invalid input parameters (generic fallback)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Empty data provided where non-empty data is required
    #[error("Empty data: {operation} requires non-empty input data")]
    EmptyData { operation: String },

    /// Sponge rate cannot be used with a 1600-bit keccak state
    #[error("Invalid rate: {rate} bytes (must be a non-zero multiple of 8 and < {max})")]
    InvalidRate { rate: usize, max: usize },

    /// A block handed to the state matrix has the wrong length
    #[error("Invalid block length: {got} bytes (rate is {rate})")]
    InvalidBlockLength { got: usize, rate: usize },

    /// The fixed-depth commitment tree cannot take more leaves
    #[error("Commitment tree full: capacity of {capacity} leaves reached")]
    TreeFull { capacity: usize },

    /// Index out of bounds
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Argument could not be packed for the oracle contract
    #[error("Encoding failure in {call}: {details}")]
    Encoding { call: &'static str, details: String },

    /// Two consecutive leaves do not chain
    #[error("Chaining violation at leaf {index}: post-state {expected} does not match next pre-state {found}")]
    ChainingViolation {
        index: usize,
        expected: B256,
        found: B256,
    },

    /// A Merkle proof does not lead to the expected root
    #[error("Merkle proof for leaf {index} does not match root {root}")]
    ProofMismatch { index: usize, root: B256 },

    /// Tree and leaf records disagree on the number of blocks
    #[error("Tree size mismatch: tree has {tree} leaves, {records} leaf records")]
    TreeSizeMismatch { tree: usize, records: usize },

    /// A claim operation was attempted from the wrong state
    #[error("Invalid claim transition: cannot {operation} while {state}")]
    InvalidClaimState {
        operation: &'static str,
        state: String,
    },

    /// Configuration validation failed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    IO(String),

    /// Failure reported by the transaction collaborator, passed through untouched
    #[error(transparent)]
    External(Box<dyn std::error::Error + Send + Sync>),

    /// Any of the above, tagged with the claim it happened on
    #[error("claim {uuid}: {source}")]
    Claim {
        uuid: U256,
        #[source]
        source: Box<LargePreimageError>,
    },
}

impl LargePreimageError {
    /// Classifies the error, looking through claim context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NilPreimageData
            | Self::InvalidInput(_)
            | Self::EmptyData { .. }
            | Self::InvalidRate { .. }
            | Self::InvalidBlockLength { .. }
            | Self::TreeFull { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::Config(_)
            | Self::Serialization(_)
            | Self::IO(_) => ErrorKind::InvalidInput,
            Self::Encoding { .. } => ErrorKind::EncodingFailure,
            Self::ChainingViolation { .. }
            | Self::TreeSizeMismatch { .. }
            | Self::ProofMismatch { .. }
            | Self::InvalidClaimState { .. } => ErrorKind::InvariantViolation,
            Self::External(_) => ErrorKind::ExternalFailure,
            Self::Claim { source, .. } => source.kind(),
        }
    }

    /// Whether resubmitting identical input may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ExternalFailure
    }

    /// Attaches claim context. Already-tagged and external errors are
    /// returned as-is.
    pub fn with_claim(self, uuid: U256) -> Self {
        match self {
            tagged @ Self::Claim { .. } => tagged,
            external @ Self::External(_) => external,
            other => Self::Claim {
                uuid,
                source: Box::new(other),
            },
        }
    }

    /// Strips claim context, returning the underlying error.
    pub fn root_cause(&self) -> &LargePreimageError {
        match self {
            Self::Claim { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Convenience Result type for large preimage operations
pub type Result<T> = std::result::Result<T, LargePreimageError>;
