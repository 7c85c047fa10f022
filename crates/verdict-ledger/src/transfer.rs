//! Outbound transfer port.
//!
//! Every payout leaves the engine through a [`PayoutSink`]. A push returns a
//! result instead of unwinding, so a beneficiary that refuses funds can
//! never roll back ledger mutations already applied.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use verdict_types::Address;

/// Why a push was refused by the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransferError(pub String);

/// Destination of direct payouts.
pub trait PayoutSink {
    /// Push `amount` to `to`.
    fn push(&mut self, to: Address, amount: Decimal) -> Result<(), TransferError>;
}

/// How a payout reached its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delivery {
    /// Pushed directly.
    Sent,
    /// Push failed; credited to the pull-payment ledger.
    Credited,
    /// Zero amount, nothing moved.
    Skipped,
}

/// In-memory sink for tests: records every accepted push and refuses pushes
/// to addresses marked as rejecting.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<(Address, Decimal)>,
    rejecting: std::collections::HashSet<Address>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every future push to `who`.
    pub fn reject(&mut self, who: Address) {
        self.rejecting.insert(who);
    }

    pub fn accept(&mut self, who: Address) {
        self.rejecting.remove(&who);
    }

    /// Total pushed to `who` so far.
    pub fn received(&self, who: &Address) -> Decimal {
        self.sent
            .iter()
            .filter(|(to, _)| to == who)
            .map(|(_, amount)| *amount)
            .sum()
    }

    pub fn total_sent(&self) -> Decimal {
        self.sent.iter().map(|(_, amount)| *amount).sum()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl PayoutSink for RecordingSink {
    fn push(&mut self, to: Address, amount: Decimal) -> Result<(), TransferError> {
        if self.rejecting.contains(&to) {
            return Err(TransferError(format!("{to} rejects incoming funds")));
        }
        self.sent.push((to, amount));
        Ok(())
    }
}
