//! Payout plans and deferred enforcement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, CaseId};

/// Where an approved award is funded from, and what is left unfunded.
///
/// Deposit is drawn before escrow. `from_deposit + from_escrow == payout`
/// and `payout + shortfall == awarded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPlan {
    pub case_id: CaseId,
    pub beneficiary: Address,
    /// The party whose deposit is drawn.
    pub offender: Address,
    pub awarded: Decimal,
    pub from_deposit: Decimal,
    pub from_escrow: Decimal,
    /// Part of the award no pool could cover (becomes outstanding judgment).
    pub shortfall: Decimal,
}

impl PayoutPlan {
    /// Total amount actually paid out.
    #[must_use]
    pub fn payout(&self) -> Decimal {
        self.from_deposit + self.from_escrow
    }

    #[must_use]
    pub fn is_capped(&self) -> bool {
        self.shortfall > Decimal::ZERO
    }
}

/// A computed payout held until its appeal window elapses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEnforcement {
    pub plan: PayoutPlan,
    pub created_at: DateTime<Utc>,
    /// Earliest time `finalize` may run.
    pub eligible_at: DateTime<Utc>,
}

impl PendingEnforcement {
    #[must_use]
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        now >= self.eligible_at
    }

    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.plan.payout()
    }
}
