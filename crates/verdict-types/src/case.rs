//! # Case — one filed dispute within an agreement
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐  denied / no window   ┌──────────────────────┐
//!   │ OPEN ├──────────────────────▶│ RESOLVED (immediate) │
//!   └──┬───┘                       └──────────────────────┘
//!      │ approved, window > 0
//!      ▼
//!   ┌────────────────────┐ finalize ┌──────────┐
//!   │ RESOLVED (pending) ├─────────▶│ ENFORCED │
//!   └────────────────────┘          └──────────┘
//! ```
//!
//! Transitions are monotonic. A case leaves OPEN exactly once, and a pending
//! case is enforced at most once, so "already enforced" is a property of
//! the state rather than of a flag.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, CaseId, EvidenceRef, Result, VerdictError};

/// What the reporter is complaining about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeKind {
    /// Damage to property or goods.
    Damage,
    /// Condition at the start of the term.
    ConditionStart,
    /// Condition at the end of the term.
    ConditionEnd,
    /// Service or delivery quality.
    Quality,
    /// One side terminated before the term ended.
    EarlyTermination,
    /// Confidentiality or other contractual breach (NDA counterparties).
    Breach,
    /// Unpaid rent or fees.
    Payment,
    /// Anything else.
    Other,
}

impl std::fmt::Display for DisputeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Damage => write!(f, "DAMAGE"),
            Self::ConditionStart => write!(f, "CONDITION_START"),
            Self::ConditionEnd => write!(f, "CONDITION_END"),
            Self::Quality => write!(f, "QUALITY"),
            Self::EarlyTermination => write!(f, "EARLY_TERMINATION"),
            Self::Breach => write!(f, "BREACH"),
            Self::Payment => write!(f, "PAYMENT"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// How an approved award is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Enforcement {
    /// Funds moved in the same step as resolution (or nothing to move).
    Immediate,
    /// Payout computed and reserved, waiting for the appeal window.
    Pending,
    /// A pending payout was finalized.
    Enforced,
}

/// Lifecycle state of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseState {
    /// Filed, waiting for a decision.
    Open,
    /// A decision was applied.
    Resolved {
        approved: bool,
        enforcement: Enforcement,
    },
}

impl CaseState {
    /// Can this state transition to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        match (self, target) {
            (Self::Open, Self::Resolved { approved, enforcement }) => match enforcement {
                Enforcement::Immediate => true,
                Enforcement::Pending => approved,
                Enforcement::Enforced => false,
            },
            (
                Self::Resolved {
                    approved: true,
                    enforcement: Enforcement::Pending,
                },
                Self::Resolved {
                    approved: true,
                    enforcement: Enforcement::Enforced,
                },
            ) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for CaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Resolved {
                approved: false, ..
            } => write!(f, "DENIED"),
            Self::Resolved {
                enforcement: Enforcement::Immediate,
                ..
            } => write!(f, "SETTLED"),
            Self::Resolved {
                enforcement: Enforcement::Pending,
                ..
            } => write!(f, "PENDING_ENFORCEMENT"),
            Self::Resolved {
                enforcement: Enforcement::Enforced,
                ..
            } => write!(f, "ENFORCED"),
        }
    }
}

/// One dispute instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub reporter: Address,
    pub offender: Address,
    pub kind: DisputeKind,
    pub requested_amount: Decimal,
    pub evidence: EvidenceRef,
    /// Bond the reporter attached when filing.
    pub bond_paid: Decimal,
    pub state: CaseState,
    /// Amount awarded. Zero until resolved, never above `requested_amount`.
    pub applied_amount: Decimal,
    /// Unfunded part of the award at resolution time.
    pub outstanding_judgment: Decimal,
    pub filed_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub rationale: Option<String>,
}

impl Case {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self.state, CaseState::Open)
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self.state, CaseState::Resolved { approved: true, .. })
    }

    #[must_use]
    pub fn is_pending_enforcement(&self) -> bool {
        matches!(
            self.state,
            CaseState::Resolved {
                enforcement: Enforcement::Pending,
                ..
            }
        )
    }

    /// Apply a decision outcome. Only valid from OPEN.
    ///
    /// # Errors
    /// `AlreadyProcessed` if the case was already resolved,
    /// `InvalidAmount` if `applied` exceeds the requested amount.
    pub fn resolve(
        &mut self,
        approved: bool,
        enforcement: Enforcement,
        applied: Decimal,
        outstanding: Decimal,
        rationale: String,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let target = CaseState::Resolved {
            approved,
            enforcement,
        };
        if !self.state.can_transition_to(target) {
            return Err(VerdictError::AlreadyProcessed {
                key: format!("{} is {}", self.id, self.state),
            });
        }
        if applied > self.requested_amount {
            return Err(VerdictError::InvalidAmount {
                reason: format!(
                    "applied {applied} exceeds requested {} for {}",
                    self.requested_amount, self.id
                ),
            });
        }
        self.state = target;
        self.applied_amount = applied;
        self.outstanding_judgment = outstanding;
        self.resolved_at = Some(at);
        self.rationale = Some(rationale);
        Ok(())
    }

    /// RESOLVED(pending) → ENFORCED.
    ///
    /// # Errors
    /// `NoPendingEnforcement` from any other state.
    pub fn mark_enforced(&mut self) -> Result<()> {
        let target = CaseState::Resolved {
            approved: true,
            enforcement: Enforcement::Enforced,
        };
        if !self.state.can_transition_to(target) {
            return Err(VerdictError::NoPendingEnforcement(self.id));
        }
        self.state = target;
        Ok(())
    }
}

/// Dummy case for unit tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Case {
    pub fn dummy(id: CaseId, requested_amount: Decimal) -> Self {
        Self {
            id,
            reporter: Address::random(),
            offender: Address::random(),
            kind: DisputeKind::Damage,
            requested_amount,
            evidence: EvidenceRef::digest(b"dummy evidence"),
            bond_paid: Decimal::new(1, 3),
            state: CaseState::Open,
            applied_amount: Decimal::ZERO,
            outstanding_judgment: Decimal::ZERO,
            filed_at: Utc::now(),
            resolved_at: None,
            rationale: None,
        }
    }
}
