//! Seam towards the transaction-management collaborator.
//!
//! Nonces, gas, signing, broadcast and retries all live behind [`TxSender`].
//! The uploader only hands over candidates and learns whether they landed.

use alloy_primitives::Address;
use std::cell::RefCell;
use std::fmt;

use crate::contract::TxCandidate;

/// Boxed error returned by a sender; forwarded to callers as-is.
pub type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Submits transactions and waits until they are accepted.
pub trait TxSender {
    /// Account the transactions are sent from; it owns the claims.
    fn from(&self) -> Address;

    /// Sends `candidates` in order and returns once all are accepted.
    fn send(&self, candidates: &[TxCandidate]) -> std::result::Result<(), SendError>;
}

impl<T: TxSender + ?Sized> TxSender for &T {
    fn from(&self) -> Address {
        (**self).from()
    }

    fn send(&self, candidates: &[TxCandidate]) -> std::result::Result<(), SendError> {
        (**self).send(candidates)
    }
}

/// Error produced by [`RecordingSender`] when told to fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedFailure {
    pub at_call: usize,
}

impl fmt::Display for InjectedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "injected send failure at call {}", self.at_call)
    }
}

impl std::error::Error for InjectedFailure {}

/// In-memory sender that accepts everything and keeps a log.
///
/// Optionally fails on the n-th `send` call, for exercising resume paths.
#[derive(Debug, Default)]
pub struct RecordingSender {
    from: Address,
    sent: RefCell<Vec<TxCandidate>>,
    calls: RefCell<usize>,
    fail_at: RefCell<Option<usize>>,
}

impl RecordingSender {
    pub fn new(from: Address) -> Self {
        Self {
            from,
            ..Self::default()
        }
    }

    /// Makes the `call`-th (zero-based) `send` fail once.
    pub fn fail_on_call(&self, call: usize) {
        *self.fail_at.borrow_mut() = Some(call);
    }

    /// Every candidate accepted so far, in order.
    pub fn sent(&self) -> Vec<TxCandidate> {
        self.sent.borrow().clone()
    }

    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
    }
}

impl TxSender for RecordingSender {
    fn from(&self) -> Address {
        self.from
    }

    fn send(&self, candidates: &[TxCandidate]) -> std::result::Result<(), SendError> {
        let call = {
            let mut calls = self.calls.borrow_mut();
            let current = *calls;
            *calls += 1;
            current
        };
        if *self.fail_at.borrow() == Some(call) {
            self.fail_at.borrow_mut().take();
            return Err(Box::new(InjectedFailure { at_call: call }));
        }
        self.sent.borrow_mut().extend_from_slice(candidates);
        Ok(())
    }
}
