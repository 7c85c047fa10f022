//! Pull-payment fallback ledger.
//!
//! When a direct push to a beneficiary fails, the full amount is credited
//! here instead. Credits are never retried automatically: the holder pulls
//! them with an explicit withdrawal.

use std::collections::HashMap;

use rust_decimal::Decimal;
use verdict_types::{Address, Result, VerdictError};

/// Per-address withdrawable balances.
#[derive(Debug, Default)]
pub struct PullPayments {
    withdrawable: HashMap<Address, Decimal>,
}

impl PullPayments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `to`.
    pub fn credit(&mut self, to: Address, amount: Decimal) {
        if amount > Decimal::ZERO {
            *self.withdrawable.entry(to).or_insert(Decimal::ZERO) += amount;
        }
    }

    #[must_use]
    pub fn balance(&self, who: &Address) -> Decimal {
        self.withdrawable
            .get(who)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Zero `who`'s balance and return what it was.
    ///
    /// # Errors
    /// `NothingToWithdraw` if the balance is zero.
    pub fn take(&mut self, who: &Address) -> Result<Decimal> {
        match self.withdrawable.remove(who) {
            Some(amount) if amount > Decimal::ZERO => Ok(amount),
            _ => Err(VerdictError::NothingToWithdraw(*who)),
        }
    }

    /// Sum of every credit.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.withdrawable.values().copied().sum()
    }
}
