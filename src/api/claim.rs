//! Claim progress as an explicit state machine.
//!
//! ```text
//! Uninitialized --init--> Absorbing --add_leaves(finalize)--> ReadyToSqueeze --squeeze--> Finalized
//!                          |    ^
//!                          +----+ add_leaves
//! ```
//!
//! Progress is counted in blocks, never in submission order, so an upload
//! abandoned between batches resumes from `blocks_accepted`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{LargePreimageError, Result};

/// Lifecycle state of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClaimState {
    #[default]
    Uninitialized,
    Absorbing,
    ReadyToSqueeze,
    Finalized,
}

impl fmt::Display for ClaimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Absorbing => "absorbing",
            Self::ReadyToSqueeze => "ready to squeeze",
            Self::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// What has been accepted so far for one claim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClaimProgress {
    pub state: ClaimState,
    /// Number of blocks the claim expects in total.
    pub total_blocks: usize,
    /// Blocks accepted by AddLeaves so far.
    pub blocks_accepted: usize,
    /// Preimage bytes accepted by AddLeaves so far.
    pub bytes_accepted: usize,
}

impl ClaimProgress {
    fn reject(&self, operation: &'static str) -> LargePreimageError {
        LargePreimageError::InvalidClaimState {
            operation,
            state: self.state.to_string(),
        }
    }

    /// Init accepted: the claim now expects `total_blocks` blocks.
    pub fn initialize(&mut self, total_blocks: usize) -> Result<()> {
        if self.state != ClaimState::Uninitialized {
            return Err(self.reject("initialize"));
        }
        if total_blocks == 0 {
            return Err(LargePreimageError::InvalidInput(
                "a claim needs at least one block".to_string(),
            ));
        }
        self.state = ClaimState::Absorbing;
        self.total_blocks = total_blocks;
        Ok(())
    }

    /// An AddLeaves batch covering `first_block..first_block + blocks` was
    /// accepted. Batches must extend the accepted prefix exactly.
    pub fn accept_batch(
        &mut self,
        first_block: usize,
        blocks: usize,
        bytes: usize,
        finalize: bool,
    ) -> Result<()> {
        if self.state != ClaimState::Absorbing {
            return Err(self.reject("add leaves"));
        }
        if first_block != self.blocks_accepted {
            return Err(LargePreimageError::InvalidInput(format!(
                "batch starts at block {} but {} blocks are accepted",
                first_block, self.blocks_accepted
            )));
        }

        let end = first_block + blocks;
        if end > self.total_blocks || finalize != (end == self.total_blocks) {
            return Err(LargePreimageError::InvalidInput(format!(
                "batch ending at block {} (finalize={}) does not fit a claim of {} blocks",
                end, finalize, self.total_blocks
            )));
        }

        self.blocks_accepted = end;
        self.bytes_accepted += bytes;
        if finalize {
            self.state = ClaimState::ReadyToSqueeze;
        }
        Ok(())
    }

    /// Squeeze accepted; the claim is terminal from here on.
    pub fn finalize(&mut self) -> Result<()> {
        if self.state != ClaimState::ReadyToSqueeze {
            return Err(self.reject("squeeze"));
        }
        self.state = ClaimState::Finalized;
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.state == ClaimState::Finalized
    }
}
