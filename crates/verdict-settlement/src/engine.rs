//! `ArbitrationEngine` — the public entry point.
//!
//! ```text
//! file_dispute ──► Agreement (registry + bond)
//!
//! admit_direct ─┐
//!               ├─► AdmissionGate.check ─► case open? ─► AdmissionGate.admit
//! admit_bridged ┘                                              │
//!                                                              ▼
//!                               SettlementExecutor.settle ─► PayoutSink / PullPayments
//!
//! finalize_enforcement ─► SettlementExecutor.finalize
//! withdraw             ─► SettlementExecutor.withdraw
//! ```
//!
//! Every state-changing call runs to completion before returning. Admission
//! failures never touch balances.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use verdict_admission::{AdmissionGate, Candidate};
use verdict_ledger::{Agreement, Delivery, NewCase, PayoutSink};
use verdict_types::{
    Address, AdmissionKey, AgreementId, AgreementStatus, Case, CaseId, Decision, EngineConfig,
    HeldFunds, LedgerEvent, MessageId, PendingEnforcement, Result, VerdictError, constants,
};

use crate::executor::{SettlementExecutor, SettlementOutcome};

/// Arbitration decision admission and escrow settlement for many agreements.
pub struct ArbitrationEngine<S: PayoutSink> {
    config: EngineConfig,
    agreements: HashMap<AgreementId, Agreement>,
    gate: AdmissionGate,
    executor: SettlementExecutor<S>,
}

impl<S: PayoutSink> ArbitrationEngine<S> {
    /// Build an engine from a validated config.
    ///
    /// # Errors
    /// `Configuration` if `config` fails validation.
    pub fn new(config: EngineConfig, sink: S) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            authority = %config.settlement_authority,
            treasury = %config.treasury,
            bond_rate_bps = config.bond.rate_bps,
            bond_minimum = %config.bond.minimum,
            "Arbitration engine started"
        );
        Ok(Self {
            gate: AdmissionGate::new(config.settlement_authority, config.rationale_limit_bytes),
            executor: SettlementExecutor::new(sink, config.treasury, config.bond.forfeit_on_denial),
            agreements: HashMap::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        self.executor.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.executor.sink_mut()
    }

    fn agreement(&self, id: &AgreementId) -> Result<&Agreement> {
        self.agreements
            .get(id)
            .ok_or(VerdictError::AgreementNotFound(*id))
    }

    fn agreement_mut(&mut self, id: &AgreementId) -> Result<&mut Agreement> {
        self.agreements
            .get_mut(id)
            .ok_or(VerdictError::AgreementNotFound(*id))
    }

    // ── Agreement lifecycle ─────────────────────────────────────────────

    /// Register an agreement. `appeal_window_secs` falls back to the
    /// configured default when `None`.
    ///
    /// # Errors
    /// `DuplicateAgreement` for a known id, `NotAParty` for equal or zero parties.
    pub fn register_agreement(
        &mut self,
        id: AgreementId,
        party_a: Address,
        party_b: Address,
        appeal_window_secs: Option<u64>,
    ) -> Result<()> {
        if self.agreements.contains_key(&id) {
            return Err(VerdictError::DuplicateAgreement(id));
        }
        let window = appeal_window_secs.unwrap_or(self.config.default_appeal_window_secs);
        let agreement = Agreement::new(id, party_a, party_b, window)?;
        tracing::info!(
            agreement = %id,
            party_a = %party_a,
            party_b = %party_b,
            appeal_window_secs = window,
            "Agreement registered"
        );
        self.agreements.insert(id, agreement);
        Ok(())
    }

    /// Change an agreement's appeal window. Settlement authority only.
    pub fn set_appeal_window(
        &mut self,
        agreement: AgreementId,
        caller: Address,
        seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if caller != self.config.settlement_authority {
            return Err(VerdictError::Unauthorized(caller));
        }
        self.agreement_mut(&agreement)?
            .set_appeal_window(seconds, now);
        Ok(())
    }

    /// Deactivate an agreement. Settlement authority or a party.
    pub fn deactivate(
        &mut self,
        agreement: AgreementId,
        caller: Address,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let is_authority = caller == self.config.settlement_authority;
        let ag = self.agreement_mut(&agreement)?;
        if !is_authority && !ag.store().is_party(&caller) {
            return Err(VerdictError::Unauthorized(caller));
        }
        ag.deactivate(caller, now)
    }

    // ── Funding ─────────────────────────────────────────────────────────

    pub fn deposit_security(
        &mut self,
        agreement: AgreementId,
        party: Address,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let ag = self
            .agreements
            .get_mut(&agreement)
            .ok_or(VerdictError::AgreementNotFound(agreement))?;
        self.executor.check_inflow(&agreement, amount)?;
        ag.deposit_security(party, amount, now)?;
        self.executor.record_inflow(agreement, amount)?;
        self.executor.verify(ag)
    }

    pub fn fund_escrow(
        &mut self,
        agreement: AgreementId,
        payer: Address,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let ag = self
            .agreements
            .get_mut(&agreement)
            .ok_or(VerdictError::AgreementNotFound(agreement))?;
        self.executor.check_inflow(&agreement, amount)?;
        ag.fund_escrow(payer, amount, now)?;
        self.executor.record_inflow(agreement, amount)?;
        self.executor.verify(ag)
    }

    /// Return part of a party's deposit after deactivation.
    pub fn withdraw_deposit(
        &mut self,
        agreement: AgreementId,
        party: Address,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Delivery> {
        let ag = self
            .agreements
            .get_mut(&agreement)
            .ok_or(VerdictError::AgreementNotFound(agreement))?;
        self.executor.release_deposit(ag, party, amount, now)
    }

    // ── Filing ──────────────────────────────────────────────────────────

    /// File a dispute with its attached bond.
    pub fn file_dispute(
        &mut self,
        agreement: AgreementId,
        filing: NewCase,
        now: DateTime<Utc>,
    ) -> Result<CaseId> {
        let bond = filing.bond_paid;
        let ag = self
            .agreements
            .get_mut(&agreement)
            .ok_or(VerdictError::AgreementNotFound(agreement))?;
        self.executor.check_inflow(&agreement, bond)?;
        let case_id = ag.file_dispute(&self.config.bond, filing, now)?;
        self.executor.record_inflow(agreement, bond)?;
        self.executor.verify(ag)?;
        Ok(case_id)
    }

    // ── Decisions ───────────────────────────────────────────────────────

    /// Admit and settle a decision delivered directly by `caller`.
    ///
    /// # Errors
    /// `Unauthorized`, `AlreadyProcessed`, `MalformedDecision`,
    /// `AgreementNotFound`, `CaseNotFound`, plus settlement errors.
    pub fn admit_direct(
        &mut self,
        decision: Decision,
        caller: Address,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let candidate = self.gate.check_direct(decision, caller)?;
        self.admit_and_settle(candidate, now)
    }

    /// Admit and settle a decision relayed over a bridge.
    ///
    /// Replay protection keys on `message_id` alone, so it holds whoever
    /// relays the message.
    pub fn admit_bridged(
        &mut self,
        message_id: MessageId,
        agreement: AgreementId,
        case_id: CaseId,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let candidate = self
            .gate
            .check_bridged(message_id, agreement, case_id, payload)?;
        self.admit_and_settle(candidate, now)
    }

    fn admit_and_settle(
        &mut self,
        candidate: Candidate,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let Candidate { key, decision } = candidate;
        let ag = self
            .agreements
            .get_mut(&decision.agreement)
            .ok_or(VerdictError::AgreementNotFound(decision.agreement))?;
        let case = ag.case(decision.case_id)?;
        if case.is_resolved() {
            tracing::warn!(
                key = %key,
                agreement = %decision.agreement,
                case = decision.case_id.0,
                state = %case.state,
                "Decision for a closed case rejected"
            );
            return Err(VerdictError::AlreadyProcessed {
                key: format!("{}/{} is {}", decision.agreement, decision.case_id, case.state),
            });
        }

        // Recorded before settlement: a failure below must not allow re-admission.
        self.gate.admit(key, &decision, now)?;
        self.executor.settle(ag, &decision, key, now)
    }

    /// Execute a deferred payout. Callable by anyone once eligible.
    pub fn finalize_enforcement(
        &mut self,
        agreement: AgreementId,
        case_id: CaseId,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let ag = self
            .agreements
            .get_mut(&agreement)
            .ok_or(VerdictError::AgreementNotFound(agreement))?;
        self.executor.finalize(ag, case_id, now)
    }

    /// Pull every withdrawable credit held by `who`.
    pub fn withdraw(&mut self, who: Address, now: DateTime<Utc>) -> Result<Decimal> {
        self.executor
            .withdraw(self.agreements.values_mut(), who, now)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn case(&self, agreement: AgreementId, case_id: CaseId) -> Result<&Case> {
        self.agreement(&agreement)?.case(case_id)
    }

    pub fn cases(&self, agreement: AgreementId) -> Result<Vec<&Case>> {
        Ok(self.agreement(&agreement)?.registry().iter().collect())
    }

    pub fn party_deposit(&self, agreement: AgreementId, party: Address) -> Result<Decimal> {
        Ok(self.agreement(&agreement)?.store().party_deposit(&party))
    }

    pub fn escrow_balance(&self, agreement: AgreementId) -> Result<Decimal> {
        Ok(self.agreement(&agreement)?.store().escrow())
    }

    /// Bond still held for a case. Zero once the case has resolved.
    pub fn case_bond(&self, agreement: AgreementId, case_id: CaseId) -> Result<Decimal> {
        let ag = self.agreement(&agreement)?;
        ag.case(case_id)?;
        Ok(ag.store().bond(case_id))
    }

    pub fn outstanding_judgment(&self, agreement: AgreementId, case_id: CaseId) -> Result<Decimal> {
        let ag = self.agreement(&agreement)?;
        ag.case(case_id)?;
        Ok(ag.store().outstanding(case_id))
    }

    pub fn pending_enforcement(
        &self,
        agreement: AgreementId,
        case_id: CaseId,
    ) -> Result<Option<&PendingEnforcement>> {
        Ok(self.agreement(&agreement)?.pending(case_id))
    }

    /// Withdrawable credit held by `who`, across every agreement.
    #[must_use]
    pub fn withdrawable(&self, who: Address) -> Decimal {
        self.agreements
            .values()
            .map(|ag| ag.payments().balance(&who))
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    #[must_use]
    pub fn is_processed(&self, key: &AdmissionKey) -> bool {
        self.gate.is_processed(key)
    }

    pub fn events(&self, agreement: AgreementId) -> Result<&[LedgerEvent]> {
        Ok(self.agreement(&agreement)?.events())
    }

    pub fn status(&self, agreement: AgreementId) -> Result<AgreementStatus> {
        Ok(self.agreement(&agreement)?.status())
    }

    pub fn held(&self, agreement: AgreementId) -> Result<HeldFunds> {
        Ok(self.agreement(&agreement)?.held())
    }

    /// Re-check an agreement's books.
    pub fn verify_conservation(&self, agreement: AgreementId) -> Result<()> {
        self.executor.verify(self.agreement(&agreement)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_ledger::RecordingSink;
    use verdict_types::{DisputeKind, DisputeRef, EvidenceRef, OriginId};

    fn authority() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn landlord() -> Address {
        Address::repeat_byte(0x11)
    }

    fn tenant() -> Address {
        Address::repeat_byte(0x22)
    }

    fn rent() -> AgreementId {
        Address::repeat_byte(0xa1)
    }

    fn engine() -> ArbitrationEngine<RecordingSink> {
        let config = EngineConfig::new(authority(), Address::repeat_byte(0x77));
        let mut engine = ArbitrationEngine::new(config, RecordingSink::new()).unwrap();
        engine
            .register_agreement(rent(), landlord(), tenant(), None)
            .unwrap();
        engine
    }

    fn filing(requested: Decimal, bond: Decimal) -> NewCase {
        NewCase {
            reporter: landlord(),
            offender: tenant(),
            kind: DisputeKind::Damage,
            requested_amount: requested,
            evidence: EvidenceRef::digest(b"ipfs://x"),
            bond_paid: bond,
        }
    }

    fn decision(case_id: CaseId) -> Decision {
        Decision {
            agreement: rent(),
            case_id,
            dispute_ref: DisputeRef::from_label("d"),
            approved: true,
            applied_amount: Decimal::new(1, 1),
            beneficiary: landlord(),
            rationale: "ok".into(),
            origin: OriginId::from_label("oracle"),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn invalid_config_rejected() {
        let config = EngineConfig::new(Address::ZERO, Address::repeat_byte(0x77));
        assert!(matches!(
            ArbitrationEngine::new(config, RecordingSink::new()),
            Err(VerdictError::Configuration(_))
        ));
    }

    #[test]
    fn duplicate_agreement_rejected() {
        let mut e = engine();
        let err = e
            .register_agreement(rent(), landlord(), tenant(), None)
            .unwrap_err();
        assert!(matches!(err, VerdictError::DuplicateAgreement(_)));
    }

    #[test]
    fn unknown_agreement_reported() {
        let mut e = engine();
        let err = e
            .deposit_security(Address::repeat_byte(0xee), tenant(), Decimal::ONE, Utc::now())
            .unwrap_err();
        assert!(matches!(err, VerdictError::AgreementNotFound(_)));
    }

    #[test]
    fn direct_decision_for_missing_case_leaves_no_record() {
        let mut e = engine();
        let err = e
            .admit_direct(decision(CaseId(5)), authority(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, VerdictError::CaseNotFound { .. }));
        assert!(!e.is_processed(&AdmissionKey::Case(rent(), CaseId(5))));
    }

    #[test]
    fn direct_settlement_end_to_end() {
        let mut e = engine();
        let now = Utc::now();
        e.deposit_security(rent(), tenant(), Decimal::ONE, now).unwrap();
        let case = e
            .file_dispute(rent(), filing(Decimal::new(1, 1), Decimal::new(1, 3)), now)
            .unwrap();
        let out = e.admit_direct(decision(case), authority(), now).unwrap();
        assert_eq!(out.payout, Decimal::new(1, 1));
        assert_eq!(e.party_deposit(rent(), tenant()).unwrap(), Decimal::new(9, 1));
        assert_eq!(e.case_bond(rent(), case).unwrap(), Decimal::ZERO);
        assert!(e.is_processed(&AdmissionKey::Case(rent(), case)));
        e.verify_conservation(rent()).unwrap();
    }

    #[test]
    fn appeal_window_authority_only() {
        let mut e = engine();
        let now = Utc::now();
        assert!(matches!(
            e.set_appeal_window(rent(), landlord(), 60, now),
            Err(VerdictError::Unauthorized(_))
        ));
        e.set_appeal_window(rent(), authority(), 60, now).unwrap();
        assert_eq!(e.status(rent()).unwrap().appeal_window_secs, 60);
    }

    #[test]
    fn stranger_cannot_deactivate() {
        let mut e = engine();
        let now = Utc::now();
        assert!(matches!(
            e.deactivate(rent(), Address::repeat_byte(0x99), now),
            Err(VerdictError::Unauthorized(_))
        ));
        e.deactivate(rent(), tenant(), now).unwrap();
        assert!(!e.status(rent()).unwrap().active);
    }
}
