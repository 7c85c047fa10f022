//! Arbitration decisions and their admission records.
//!
//! A [`Decision`] is an immutable outcome produced elsewhere (locally, by an
//! off-chain oracle, or on a remote chain). The engine treats it as opaque and
//! already authenticated: it only checks structure and replays.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, AgreementId, CaseId, DisputeRef, MessageId, OriginId};

/// The outcome to apply to one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Agreement the decision targets.
    pub agreement: AgreementId,
    pub case_id: CaseId,
    /// Dispute identifier assigned by the reasoning layer.
    pub dispute_ref: DisputeRef,
    pub approved: bool,
    /// Award amount. Ignored when `approved` is false.
    pub applied_amount: Decimal,
    /// Who receives the payout.
    pub beneficiary: Address,
    pub rationale: String,
    /// Oracle (or bridge lane) that produced the decision.
    pub origin: OriginId,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    /// Amount this decision awards, zero for denials.
    #[must_use]
    pub fn awarded(&self) -> Decimal {
        if self.approved {
            self.applied_amount
        } else {
            Decimal::ZERO
        }
    }
}

/// How a decision reached the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryPath {
    /// Direct call from the settlement authority.
    Direct,
    /// Decoded from a cross-chain bridge message.
    Bridged,
}

impl fmt::Display for DeliveryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "DIRECT"),
            Self::Bridged => write!(f, "BRIDGED"),
        }
    }
}

/// Replay-protection key. Derived differently per delivery path so that both
/// paths share one admission primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum AdmissionKey {
    /// Direct path: one admission per (agreement, case).
    Case(AgreementId, CaseId),
    /// Bridged path: one admission per bridge message, whoever relays it.
    Message(MessageId),
}

impl AdmissionKey {
    #[must_use]
    pub fn path(&self) -> DeliveryPath {
        match self {
            Self::Case(..) => DeliveryPath::Direct,
            Self::Message(_) => DeliveryPath::Bridged,
        }
    }
}

impl fmt::Display for AdmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Case(agreement, case_id) => write!(f, "{agreement}/{case_id}"),
            Self::Message(id) => write!(f, "{id}"),
        }
    }
}

/// Permanent marker written the instant a decision is admitted, before any
/// settlement runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDecision {
    pub key: AdmissionKey,
    pub agreement: AgreementId,
    pub case_id: CaseId,
    pub origin: OriginId,
    pub admitted_at: DateTime<Utc>,
}
