//! Audit events for the Verdict ledger.
//!
//! Every state change on an agreement appends a [`LedgerEvent`] to that
//! agreement's append-only log, exposed read-only to dashboards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, AdmissionKey, CaseId, DisputeKind};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    DisputeFiled {
        case_id: CaseId,
        reporter: Address,
        offender: Address,
        kind: DisputeKind,
        requested: Decimal,
        bond: Decimal,
    },
    DecisionAdmitted {
        case_id: CaseId,
        key: AdmissionKey,
    },
    DisputeResolved {
        case_id: CaseId,
        approved: bool,
        applied: Decimal,
        beneficiary: Address,
    },
    /// The award exceeded the funds available; the remainder is owed.
    PayoutCapped {
        case_id: CaseId,
        awarded: Decimal,
        paid: Decimal,
        outstanding: Decimal,
    },
    EnforcementDeferred {
        case_id: CaseId,
        amount: Decimal,
        eligible_at: DateTime<Utc>,
    },
    EnforcementFinalized {
        case_id: CaseId,
        amount: Decimal,
    },
    /// A direct push succeeded.
    PaymentSent { to: Address, amount: Decimal },
    /// A direct push failed and was credited for withdrawal instead.
    PaymentCredited { to: Address, amount: Decimal },
    PaymentWithdrawn { to: Address, amount: Decimal },
    BondRefunded {
        case_id: CaseId,
        to: Address,
        amount: Decimal,
    },
    BondForfeited {
        case_id: CaseId,
        to: Address,
        amount: Decimal,
    },
    DepositMade { party: Address, amount: Decimal },
    EscrowFunded { payer: Address, amount: Decimal },
    DepositWithdrawn { party: Address, amount: Decimal },
    AppealWindowChanged { seconds: u64 },
    AgreementDeactivated { by: Address },
}

impl EventKind {
    /// Stable event name for logs and filters.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DisputeFiled { .. } => "DISPUTE_FILED",
            Self::DecisionAdmitted { .. } => "DECISION_ADMITTED",
            Self::DisputeResolved { .. } => "DISPUTE_RESOLVED",
            Self::PayoutCapped { .. } => "PAYOUT_CAPPED",
            Self::EnforcementDeferred { .. } => "ENFORCEMENT_DEFERRED",
            Self::EnforcementFinalized { .. } => "ENFORCEMENT_FINALIZED",
            Self::PaymentSent { .. } => "PAYMENT_SENT",
            Self::PaymentCredited { .. } => "PAYMENT_CREDITED",
            Self::PaymentWithdrawn { .. } => "PAYMENT_WITHDRAWN",
            Self::BondRefunded { .. } => "BOND_REFUNDED",
            Self::BondForfeited { .. } => "BOND_FORFEITED",
            Self::DepositMade { .. } => "DEPOSIT_MADE",
            Self::EscrowFunded { .. } => "ESCROW_FUNDED",
            Self::DepositWithdrawn { .. } => "DEPOSIT_WITHDRAWN",
            Self::AppealWindowChanged { .. } => "APPEAL_WINDOW_CHANGED",
            Self::AgreementDeactivated { .. } => "AGREEMENT_DEACTIVATED",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A sequenced entry in an agreement's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Position in the agreement's log, starting at 0.
    pub sequence: u64,
    pub kind: EventKind,
    pub at: DateTime<Utc>,
}
