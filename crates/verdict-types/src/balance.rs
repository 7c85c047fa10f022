//! Balance snapshots for the Verdict escrow model.
//!
//! Every agreement holds funds in five places: party deposits, the escrow
//! balance, reporter bonds, payouts reserved for pending enforcement, and
//! pull-payment credits. [`HeldFunds`] is the per-pool breakdown.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Funds an agreement is currently holding, by pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeldFunds {
    pub deposits: Decimal,
    pub escrow: Decimal,
    pub bonds: Decimal,
    /// Payouts computed but waiting for their appeal window.
    pub pending: Decimal,
    /// Failed pushes awaiting withdrawal.
    pub withdrawable: Decimal,
}

impl HeldFunds {
    /// Everything held, across all pools.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.deposits + self.escrow + self.bonds + self.pending + self.withdrawable
    }

    /// [`total`](Self::total), or `None` if the pools sum past `Decimal::MAX`.
    #[must_use]
    pub fn checked_total(&self) -> Option<Decimal> {
        [self.escrow, self.bonds, self.pending, self.withdrawable]
            .into_iter()
            .try_fold(self.deposits, Decimal::checked_add)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total().is_zero()
    }
}

/// Dashboard summary of one agreement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgreementStatus {
    pub active: bool,
    pub total_deposits: Decimal,
    pub escrow: Decimal,
    /// Cases that are open or waiting for enforcement.
    pub open_cases: usize,
    pub appeal_window_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_funds_default_is_zero() {
        let held = HeldFunds::default();
        assert_eq!(held.total(), Decimal::ZERO);
        assert!(held.is_zero());
    }

    #[test]
    fn held_funds_total() {
        let held = HeldFunds {
            deposits: Decimal::new(5, 1),
            escrow: Decimal::new(3, 1),
            bonds: Decimal::new(1, 2),
            pending: Decimal::ZERO,
            withdrawable: Decimal::new(2, 1),
        };
        assert_eq!(held.total(), Decimal::new(101, 2));
        assert_eq!(held.checked_total(), Some(Decimal::new(101, 2)));
        assert!(!held.is_zero());
    }

    #[test]
    fn checked_total_detects_overflow() {
        let held = HeldFunds {
            deposits: Decimal::MAX,
            escrow: Decimal::ONE,
            ..HeldFunds::default()
        };
        assert_eq!(held.checked_total(), None);
    }

    #[test]
    fn held_funds_serde_roundtrip() {
        let held = HeldFunds {
            deposits: Decimal::new(12345, 2),
            escrow: Decimal::new(678, 1),
            ..HeldFunds::default()
        };
        let json = serde_json::to_string(&held).unwrap();
        let back: HeldFunds = serde_json::from_str(&json).unwrap();
        assert_eq!(held, back);
    }
}
