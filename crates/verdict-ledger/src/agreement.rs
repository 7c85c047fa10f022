//! The `Agreement` aggregate — everything the engine keeps per agreement.
//!
//! ```text
//! Agreement
//!   ├── LedgerStore        deposits, escrow, bonds, outstanding judgments
//!   ├── CaseRegistry       append-only case list
//!   ├── pending            at most one PendingEnforcement per case
//!   ├── PullPayments       withdrawable credits from failed pushes
//!   └── events             audit log
//! ```
//!
//! Filing and funding live here. Fund movement after a decision belongs to
//! the settlement executor, which reaches the parts through the `*_mut`
//! accessors.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use verdict_types::{
    Address, AgreementId, AgreementStatus, BondPolicy, Case, CaseId, EventKind, HeldFunds,
    LedgerEvent, PendingEnforcement, Result, VerdictError, amount as money,
};

use crate::bond_policy;
use crate::case_registry::{CaseRegistry, NewCase};
use crate::ledger_store::LedgerStore;
use crate::pull_payment::PullPayments;

/// State of a single agreement under arbitration.
pub struct Agreement {
    id: AgreementId,
    store: LedgerStore,
    registry: CaseRegistry,
    pending: BTreeMap<CaseId, PendingEnforcement>,
    payments: PullPayments,
    appeal_window_secs: u64,
    active: bool,
    events: Vec<LedgerEvent>,
}

impl Agreement {
    /// Register a new, active agreement between two parties.
    ///
    /// # Errors
    /// `NotAParty` if the parties are equal or zero.
    pub fn new(
        id: AgreementId,
        party_a: Address,
        party_b: Address,
        appeal_window_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            id,
            store: LedgerStore::new(party_a, party_b)?,
            registry: CaseRegistry::new(id),
            pending: BTreeMap::new(),
            payments: PullPayments::new(),
            appeal_window_secs,
            active: true,
            events: Vec::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> AgreementId {
        self.id
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn appeal_window_secs(&self) -> u64 {
        self.appeal_window_secs
    }

    fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(VerdictError::AgreementInactive {
                agreement: self.id,
                reason: "is inactive".into(),
            })
        }
    }

    /// Fails with `InvalidAmount` unless the agreement can take in `amount`
    /// more while every pool still sums within `Decimal` range.
    fn ensure_headroom(&self, amount: Decimal, what: &str) -> Result<()> {
        let held = self.held().checked_total().ok_or_else(|| {
            VerdictError::Internal(format!("agreement {} holdings overflow", self.id))
        })?;
        money::checked_add(held, amount, what).map(|_| ())
    }

    // ── Filing ──────────────────────────────────────────────────────────

    /// File a dispute and hold the attached bond against the new case.
    ///
    /// # Errors
    /// - `AgreementInactive` after deactivation
    /// - `NotAParty` if either side is a stranger, or reporter == offender
    /// - `InvalidAmount` for a negative claim, or a bond the agreement cannot hold
    /// - `InsufficientBond` if the bond is below policy
    pub fn file_dispute(
        &mut self,
        policy: &BondPolicy,
        filing: NewCase,
        now: DateTime<Utc>,
    ) -> Result<CaseId> {
        self.ensure_active()?;
        self.store.ensure_party(&filing.reporter)?;
        self.store.ensure_party(&filing.offender)?;
        if filing.reporter == filing.offender {
            return Err(VerdictError::NotAParty(filing.offender));
        }
        money::ensure_non_negative(filing.requested_amount, "requested amount")?;
        let required =
            bond_policy::check_bond(policy, filing.requested_amount, filing.bond_paid)?;

        let reporter = filing.reporter;
        let offender = filing.offender;
        let kind = filing.kind;
        let requested = filing.requested_amount;
        let bond = filing.bond_paid;

        self.ensure_headroom(bond, "bond")?;

        let case_id = self.registry.append(filing, now);
        self.store.hold_bond(case_id, bond)?;

        tracing::info!(
            agreement = %self.id,
            case = case_id.0,
            reporter = %reporter,
            offender = %offender,
            requested = %requested,
            bond = %bond,
            required = %required,
            "Dispute filed"
        );
        self.record_event(
            EventKind::DisputeFiled {
                case_id,
                reporter,
                offender,
                kind,
                requested,
                bond,
            },
            now,
        );
        Ok(case_id)
    }

    // ── Funding ─────────────────────────────────────────────────────────

    /// Credit a party's security deposit.
    pub fn deposit_security(
        &mut self,
        party: Address,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_active()?;
        self.ensure_headroom(amount, "deposit")?;
        self.store.deposit(party, amount)?;
        tracing::info!(agreement = %self.id, party = %party, amount = %amount, "Deposit made");
        self.record_event(EventKind::DepositMade { party, amount }, now);
        Ok(())
    }

    /// Credit the escrow balance. Only parties may fund it.
    pub fn fund_escrow(&mut self, payer: Address, amount: Decimal, now: DateTime<Utc>) -> Result<()> {
        self.ensure_active()?;
        self.store.ensure_party(&payer)?;
        self.ensure_headroom(amount, "escrow funding")?;
        self.store.fund_escrow(amount)?;
        tracing::info!(agreement = %self.id, payer = %payer, amount = %amount, "Escrow funded");
        self.record_event(EventKind::EscrowFunded { payer, amount }, now);
        Ok(())
    }

    /// Take `amount` out of a party's deposit for release back to them.
    ///
    /// Only allowed once the agreement is inactive and nothing is left to
    /// settle. The caller performs the actual transfer.
    ///
    /// # Errors
    /// `AgreementInactive` while active, `OpenCasesRemain`, `NotAParty`,
    /// `InsufficientDeposit`.
    pub fn release_deposit(&mut self, party: Address, amount: Decimal) -> Result<()> {
        if self.active {
            return Err(VerdictError::AgreementInactive {
                agreement: self.id,
                reason: "is still active".into(),
            });
        }
        let open = self.open_case_count();
        if open > 0 {
            return Err(VerdictError::OpenCasesRemain(open));
        }
        self.store.ensure_party(&party)?;
        self.store.debit_deposit(&party, amount)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Change the appeal window for decisions admitted from now on.
    pub fn set_appeal_window(&mut self, seconds: u64, now: DateTime<Utc>) {
        self.appeal_window_secs = seconds;
        tracing::info!(agreement = %self.id, seconds, "Appeal window changed");
        self.record_event(EventKind::AppealWindowChanged { seconds }, now);
    }

    /// Stop accepting disputes and funding.
    ///
    /// # Errors
    /// `AgreementInactive` if already deactivated.
    pub fn deactivate(&mut self, by: Address, now: DateTime<Utc>) -> Result<()> {
        self.ensure_active()?;
        self.active = false;
        tracing::info!(agreement = %self.id, by = %by, "Agreement deactivated");
        self.record_event(EventKind::AgreementDeactivated { by }, now);
        Ok(())
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Append an audit event and return its sequence number.
    pub fn record_event(&mut self, kind: EventKind, at: DateTime<Utc>) -> u64 {
        let sequence = self.events.len() as u64;
        self.events.push(LedgerEvent { sequence, kind, at });
        sequence
    }

    #[must_use]
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    // ── Parts ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LedgerStore {
        &mut self.store
    }

    #[must_use]
    pub fn registry(&self) -> &CaseRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CaseRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn payments(&self) -> &PullPayments {
        &self.payments
    }

    pub fn payments_mut(&mut self) -> &mut PullPayments {
        &mut self.payments
    }

    #[must_use]
    pub fn pending(&self, case_id: CaseId) -> Option<&PendingEnforcement> {
        self.pending.get(&case_id)
    }

    pub fn pending_iter(&self) -> impl Iterator<Item = &PendingEnforcement> {
        self.pending.values()
    }

    /// Queue a deferred payout. At most one entry per case.
    ///
    /// # Errors
    /// `AlreadyProcessed` if the case already has one.
    pub fn enqueue_pending(&mut self, entry: PendingEnforcement) -> Result<()> {
        let case_id = entry.plan.case_id;
        if self.pending.contains_key(&case_id) {
            return Err(VerdictError::AlreadyProcessed {
                key: format!("{}/{case_id} already pending", self.id),
            });
        }
        self.pending.insert(case_id, entry);
        Ok(())
    }

    /// Remove and return a deferred payout.
    ///
    /// # Errors
    /// `NoPendingEnforcement` if none exists for the case.
    pub fn take_pending(&mut self, case_id: CaseId) -> Result<PendingEnforcement> {
        self.pending
            .remove(&case_id)
            .ok_or(VerdictError::NoPendingEnforcement(case_id))
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Read-only case projection.
    pub fn case(&self, case_id: CaseId) -> Result<&Case> {
        self.registry.get(case_id)
    }

    #[must_use]
    pub fn open_case_count(&self) -> usize {
        self.registry.open_count()
    }

    /// Everything the agreement currently holds, pool by pool.
    #[must_use]
    pub fn held(&self) -> HeldFunds {
        HeldFunds {
            deposits: self.store.total_deposits(),
            escrow: self.store.escrow(),
            bonds: self.store.total_bonds(),
            pending: self.pending_iter().map(PendingEnforcement::amount).sum(),
            withdrawable: self.payments.total(),
        }
    }

    #[must_use]
    pub fn status(&self) -> AgreementStatus {
        AgreementStatus {
            active: self.active,
            total_deposits: self.store.total_deposits(),
            escrow: self.store.escrow(),
            open_cases: self.open_case_count(),
            appeal_window_secs: self.appeal_window_secs,
        }
    }
}
