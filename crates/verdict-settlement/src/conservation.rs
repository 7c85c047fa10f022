//! Per-agreement conservation checker.
//!
//! Invariant verified after every mutating operation:
//! ```text
//! ∀ agreement: inflow - outflow == deposits + escrow + bonds + pending + withdrawable
//! ```
//!
//! Inflows are deposits, escrow funding and filing bonds. Outflows are
//! successful pushes and withdrawals. Settlement only moves value between
//! pools, so any other difference means money was created or lost.

use std::collections::HashMap;

use rust_decimal::Decimal;
use verdict_types::{AgreementId, HeldFunds, Result, VerdictError, amount as money};

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    inflow: Decimal,
    outflow: Decimal,
}

/// Cumulative in/out totals per agreement.
#[derive(Debug, Default)]
pub struct Conservation {
    totals: HashMap<AgreementId, Totals>,
}

impl Conservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `InvalidAmount` if `amount` would push the agreement's
    /// cumulative inflow past `Decimal::MAX`. Nothing is recorded.
    pub fn check_inflow(&self, agreement: &AgreementId, amount: Decimal) -> Result<Decimal> {
        money::checked_add(self.total_inflow(agreement), amount, "agreement inflow")
    }

    pub fn record_inflow(&mut self, agreement: AgreementId, amount: Decimal) -> Result<()> {
        let inflow = self.check_inflow(&agreement, amount)?;
        self.totals.entry(agreement).or_default().inflow = inflow;
        Ok(())
    }

    /// Outflow never exceeds inflow while the books balance, so it cannot
    /// overflow before inflow does.
    pub fn record_outflow(&mut self, agreement: AgreementId, amount: Decimal) {
        let totals = self.totals.entry(agreement).or_default();
        totals.outflow = totals.outflow.saturating_add(amount);
    }

    /// What the agreement should be holding: inflow - outflow.
    #[must_use]
    pub fn expected(&self, agreement: &AgreementId) -> Decimal {
        self.totals
            .get(agreement)
            .map_or(Decimal::ZERO, |t| t.inflow - t.outflow)
    }

    #[must_use]
    pub fn total_inflow(&self, agreement: &AgreementId) -> Decimal {
        self.totals.get(agreement).map_or(Decimal::ZERO, |t| t.inflow)
    }

    #[must_use]
    pub fn total_outflow(&self, agreement: &AgreementId) -> Decimal {
        self.totals.get(agreement).map_or(Decimal::ZERO, |t| t.outflow)
    }

    /// Compare the held pools against the expected balance.
    ///
    /// # Errors
    /// `ConservationViolation` if they differ.
    pub fn verify(&self, agreement: &AgreementId, held: &HeldFunds) -> Result<()> {
        let expected = self.expected(agreement);
        let actual = held.total();
        if actual != expected {
            tracing::error!(
                agreement = %agreement,
                expected = %expected,
                actual = %actual,
                "Conservation violated"
            );
            return Err(VerdictError::ConservationViolation {
                reason: format!(
                    "agreement {agreement}: held {actual} != expected {expected} \
                     (inflow={}, outflow={})",
                    self.total_inflow(agreement),
                    self.total_outflow(agreement),
                ),
            });
        }
        Ok(())
    }
}
