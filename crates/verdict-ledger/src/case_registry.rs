//! Case registry — the append-only list of disputes for one agreement.
//!
//! Cases are numbered from 0 in filing order. The registry only appends;
//! resolution fields change through [`Case::resolve`] and
//! [`Case::mark_enforced`], which the settlement executor drives.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use verdict_types::{
    Address, AgreementId, Case, CaseId, CaseState, DisputeKind, EvidenceRef, Result, VerdictError,
};

/// Details of a new dispute, as submitted by the reporter.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub reporter: Address,
    pub offender: Address,
    pub kind: DisputeKind,
    pub requested_amount: Decimal,
    pub evidence: EvidenceRef,
    pub bond_paid: Decimal,
}

/// Per-agreement list of cases.
pub struct CaseRegistry {
    agreement: AgreementId,
    cases: Vec<Case>,
}

impl CaseRegistry {
    #[must_use]
    pub fn new(agreement: AgreementId) -> Self {
        Self {
            agreement,
            cases: Vec::new(),
        }
    }

    /// Append a new OPEN case and return its id.
    ///
    /// Party and bond checks are the caller's job; the registry only records.
    pub fn append(&mut self, new: NewCase, filed_at: DateTime<Utc>) -> CaseId {
        let id = CaseId(self.cases.len() as u64);
        self.cases.push(Case {
            id,
            reporter: new.reporter,
            offender: new.offender,
            kind: new.kind,
            requested_amount: new.requested_amount,
            evidence: new.evidence,
            bond_paid: new.bond_paid,
            state: CaseState::Open,
            applied_amount: Decimal::ZERO,
            outstanding_judgment: Decimal::ZERO,
            filed_at,
            resolved_at: None,
            rationale: None,
        });
        id
    }

    /// Read-only view of a case.
    ///
    /// # Errors
    /// `CaseNotFound` if `case_id` is out of range.
    pub fn get(&self, case_id: CaseId) -> Result<&Case> {
        usize::try_from(case_id.0)
            .ok()
            .and_then(|idx| self.cases.get(idx))
            .ok_or(VerdictError::CaseNotFound {
                agreement: self.agreement,
                case_id,
            })
    }

    /// Mutable access for the settlement executor.
    pub fn get_mut(&mut self, case_id: CaseId) -> Result<&mut Case> {
        let agreement = self.agreement;
        usize::try_from(case_id.0)
            .ok()
            .and_then(|idx| self.cases.get_mut(idx))
            .ok_or(VerdictError::CaseNotFound {
                agreement,
                case_id,
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Cases not yet resolved, or resolved but still awaiting enforcement.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| !c.is_resolved() || c.is_pending_enforcement())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Case> {
        self.cases.iter()
    }
}
