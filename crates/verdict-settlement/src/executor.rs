//! Settlement executor — applies admitted decisions to an agreement.
//!
//! For an admitted decision:
//! 1. Denied: resolve the case with nothing applied, settle the bond
//! 2. Approved: clamp the award to the claim, draw `min(award, available)`
//!    from the offender's deposit first and escrow second, record any
//!    shortfall as an outstanding judgment
//! 3. No appeal window: resolve and pay now
//! 4. Appeal window: resolve as pending, queue a `PendingEnforcement`
//! 5. Settle the reporter bond
//! 6. Verify conservation
//!
//! Ledger mutations always happen before the push. A failed push becomes a
//! withdrawable credit and never fails the settlement.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use verdict_ledger::{Agreement, Delivery, PayoutSink};
use verdict_types::{
    Address, AdmissionKey, AgreementId, CaseId, Decision, Enforcement, EventKind, PayoutPlan,
    PendingEnforcement, Result, VerdictError,
};

use crate::bond::{self, BondSplit};
use crate::conservation::Conservation;
use crate::reentrancy::{InFlight, SettlementLock};

/// Result of settling or finalizing a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub agreement: AgreementId,
    pub case_id: CaseId,
    pub approved: bool,
    /// Award after clamping to the requested amount.
    pub awarded: Decimal,
    /// Amount drawn from the agreement's pools.
    pub payout: Decimal,
    /// Unfunded remainder.
    pub outstanding: Decimal,
    pub enforcement: Enforcement,
    /// How the payout reached the beneficiary. `None` while deferred.
    pub delivery: Option<Delivery>,
    pub bond_refund: Decimal,
    pub bond_forfeit: Decimal,
}

/// Moves money for admitted decisions.
pub struct SettlementExecutor<S: PayoutSink> {
    sink: S,
    books: Conservation,
    lock: SettlementLock,
    treasury: Address,
    forfeit_on_denial: bool,
}

impl<S: PayoutSink> SettlementExecutor<S> {
    pub fn new(sink: S, treasury: Address, forfeit_on_denial: bool) -> Self {
        Self {
            sink,
            books: Conservation::new(),
            lock: SettlementLock::new(),
            treasury,
            forfeit_on_denial,
        }
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn books(&self) -> &Conservation {
        &self.books
    }

    #[must_use]
    pub fn lock(&self) -> &SettlementLock {
        &self.lock
    }

    /// Fails with `InvalidAmount` if the books could not record `amount`
    /// more inflow for `agreement`.
    pub fn check_inflow(&self, agreement: &AgreementId, amount: Decimal) -> Result<()> {
        self.books.check_inflow(agreement, amount).map(|_| ())
    }

    /// Record money entering an agreement (deposit, escrow funding, bond).
    pub fn record_inflow(&mut self, agreement: AgreementId, amount: Decimal) -> Result<()> {
        self.books.record_inflow(agreement, amount)
    }

    /// Check the agreement's books.
    pub fn verify(&self, agreement: &Agreement) -> Result<()> {
        self.books.verify(&agreement.id(), &agreement.held())
    }

    // ── Settlement ──────────────────────────────────────────────────────

    /// Apply an admitted decision to its case.
    ///
    /// # Errors
    /// - `ReentrantCall` if the case is already being settled
    /// - `CaseNotFound` / `AlreadyProcessed` if the case is missing or resolved
    /// - `ConservationViolation` if the books do not balance afterwards
    pub fn settle(
        &mut self,
        agreement: &mut Agreement,
        decision: &Decision,
        key: AdmissionKey,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let in_flight = InFlight::Case(agreement.id(), decision.case_id);
        self.lock.enter(in_flight)?;
        let result = self.settle_locked(agreement, decision, key, now);
        self.lock.exit(&in_flight);
        let outcome = result?;
        self.verify(agreement)?;
        Ok(outcome)
    }

    fn settle_locked(
        &mut self,
        agreement: &mut Agreement,
        decision: &Decision,
        key: AdmissionKey,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let case_id = decision.case_id;
        let case = agreement.case(case_id)?;
        if case.is_resolved() {
            return Err(VerdictError::AlreadyProcessed {
                key: format!("{}/{case_id} is {}", agreement.id(), case.state),
            });
        }
        let reporter = case.reporter;
        let offender = case.offender;
        let requested = case.requested_amount;

        agreement.record_event(EventKind::DecisionAdmitted { case_id, key }, now);

        if !decision.approved {
            return self.settle_denial(agreement, decision, reporter, now);
        }

        // ── Plan ────────────────────────────────────────────────────────
        let awarded = decision.applied_amount.min(requested);
        if decision.applied_amount > requested {
            tracing::warn!(
                agreement = %agreement.id(),
                case = case_id.0,
                applied = %decision.applied_amount,
                requested = %requested,
                "Applied amount clamped to requested"
            );
        }
        let available = agreement.store().available_against(&offender);
        let payout = awarded.min(available);
        let draw = agreement.store().plan_draw(&offender, payout)?;
        let plan = PayoutPlan {
            case_id,
            beneficiary: decision.beneficiary,
            offender,
            awarded,
            from_deposit: draw.from_deposit,
            from_escrow: draw.from_escrow,
            shortfall: awarded - payout,
        };
        tracing::debug!(
            agreement = %agreement.id(),
            case = case_id.0,
            awarded = %awarded,
            available = %available,
            from_deposit = %plan.from_deposit,
            from_escrow = %plan.from_escrow,
            shortfall = %plan.shortfall,
            "Payout planned"
        );

        let window = agreement.appeal_window_secs();
        let enforcement = if window == 0 {
            Enforcement::Immediate
        } else {
            Enforcement::Pending
        };
        let eligible = eligible_at(now, window)?;

        // ── Apply ───────────────────────────────────────────────────────
        agreement.registry_mut().get_mut(case_id)?.resolve(
            true,
            enforcement,
            awarded,
            plan.shortfall,
            decision.rationale.clone(),
            now,
        )?;
        agreement.store_mut().draw(&offender, payout)?;
        agreement
            .store_mut()
            .record_outstanding(case_id, plan.shortfall);
        if plan.is_capped() {
            tracing::warn!(
                agreement = %agreement.id(),
                case = case_id.0,
                awarded = %awarded,
                paid = %payout,
                outstanding = %plan.shortfall,
                "Payout capped by available funds"
            );
            agreement.record_event(
                EventKind::PayoutCapped {
                    case_id,
                    awarded,
                    paid: payout,
                    outstanding: plan.shortfall,
                },
                now,
            );
        }
        agreement.record_event(
            EventKind::DisputeResolved {
                case_id,
                approved: true,
                applied: awarded,
                beneficiary: decision.beneficiary,
            },
            now,
        );

        let delivery = if enforcement == Enforcement::Pending {
            agreement.enqueue_pending(PendingEnforcement {
                plan: plan.clone(),
                created_at: now,
                eligible_at: eligible,
            })?;
            tracing::info!(
                agreement = %agreement.id(),
                case = case_id.0,
                amount = %payout,
                eligible_at = %eligible,
                "Enforcement deferred"
            );
            agreement.record_event(
                EventKind::EnforcementDeferred {
                    case_id,
                    amount: payout,
                    eligible_at: eligible,
                },
                now,
            );
            None
        } else {
            Some(self.pay(agreement, decision.beneficiary, payout, now))
        };

        let split = bond::split_bond(
            agreement.store().bond(case_id),
            true,
            self.forfeit_on_denial,
            payout,
            decision.beneficiary == reporter,
        );
        self.settle_bond(agreement, case_id, reporter, split, now);

        tracing::info!(
            agreement = %agreement.id(),
            case = case_id.0,
            awarded = %awarded,
            payout = %payout,
            outstanding = %plan.shortfall,
            enforcement = ?enforcement,
            "Dispute settled"
        );
        Ok(SettlementOutcome {
            agreement: agreement.id(),
            case_id,
            approved: true,
            awarded,
            payout,
            outstanding: plan.shortfall,
            enforcement,
            delivery,
            bond_refund: split.refund,
            bond_forfeit: split.forfeit,
        })
    }

    fn settle_denial(
        &mut self,
        agreement: &mut Agreement,
        decision: &Decision,
        reporter: Address,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let case_id = decision.case_id;
        agreement.registry_mut().get_mut(case_id)?.resolve(
            false,
            Enforcement::Immediate,
            Decimal::ZERO,
            Decimal::ZERO,
            decision.rationale.clone(),
            now,
        )?;
        agreement.record_event(
            EventKind::DisputeResolved {
                case_id,
                approved: false,
                applied: Decimal::ZERO,
                beneficiary: decision.beneficiary,
            },
            now,
        );
        let split = bond::split_bond(
            agreement.store().bond(case_id),
            false,
            self.forfeit_on_denial,
            Decimal::ZERO,
            false,
        );
        self.settle_bond(agreement, case_id, reporter, split, now);
        tracing::info!(
            agreement = %agreement.id(),
            case = case_id.0,
            bond_refund = %split.refund,
            bond_forfeit = %split.forfeit,
            "Dispute denied"
        );
        Ok(SettlementOutcome {
            agreement: agreement.id(),
            case_id,
            approved: false,
            awarded: Decimal::ZERO,
            payout: Decimal::ZERO,
            outstanding: Decimal::ZERO,
            enforcement: Enforcement::Immediate,
            delivery: None,
            bond_refund: split.refund,
            bond_forfeit: split.forfeit,
        })
    }

    fn settle_bond(
        &mut self,
        agreement: &mut Agreement,
        case_id: CaseId,
        reporter: Address,
        split: BondSplit,
        now: DateTime<Utc>,
    ) {
        let held = agreement.store_mut().take_bond(case_id);
        debug_assert_eq!(held, split.total());
        if split.refund > Decimal::ZERO {
            self.pay(agreement, reporter, split.refund, now);
            agreement.record_event(
                EventKind::BondRefunded {
                    case_id,
                    to: reporter,
                    amount: split.refund,
                },
                now,
            );
        }
        if split.forfeit > Decimal::ZERO {
            let treasury = self.treasury;
            self.pay(agreement, treasury, split.forfeit, now);
            agreement.record_event(
                EventKind::BondForfeited {
                    case_id,
                    to: treasury,
                    amount: split.forfeit,
                },
                now,
            );
        }
    }

    // ── Deferred enforcement ────────────────────────────────────────────

    /// Execute a deferred payout once its appeal window has elapsed.
    ///
    /// # Errors
    /// - `NoPendingEnforcement` if nothing is queued (never or already finalized)
    /// - `AppealWindowNotElapsed` if called before the eligibility time
    pub fn finalize(
        &mut self,
        agreement: &mut Agreement,
        case_id: CaseId,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let in_flight = InFlight::Case(agreement.id(), case_id);
        self.lock.enter(in_flight)?;
        let result = self.finalize_locked(agreement, case_id, now);
        self.lock.exit(&in_flight);
        let outcome = result?;
        self.verify(agreement)?;
        Ok(outcome)
    }

    fn finalize_locked(
        &mut self,
        agreement: &mut Agreement,
        case_id: CaseId,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let pending = agreement
            .pending(case_id)
            .ok_or(VerdictError::NoPendingEnforcement(case_id))?;
        if !pending.is_eligible(now) {
            return Err(VerdictError::AppealWindowNotElapsed {
                case_id,
                eligible_at: pending.eligible_at,
            });
        }
        let pending = agreement.take_pending(case_id)?;
        agreement.registry_mut().get_mut(case_id)?.mark_enforced()?;

        let plan = pending.plan;
        let amount = plan.payout();
        let delivery = self.pay(agreement, plan.beneficiary, amount, now);
        agreement.record_event(EventKind::EnforcementFinalized { case_id, amount }, now);
        tracing::info!(
            agreement = %agreement.id(),
            case = case_id.0,
            amount = %amount,
            delivery = ?delivery,
            "Enforcement finalized"
        );
        Ok(SettlementOutcome {
            agreement: agreement.id(),
            case_id,
            approved: true,
            awarded: plan.awarded,
            payout: amount,
            outstanding: plan.shortfall,
            enforcement: Enforcement::Enforced,
            delivery: Some(delivery),
            bond_refund: Decimal::ZERO,
            bond_forfeit: Decimal::ZERO,
        })
    }

    // ── Transfers ───────────────────────────────────────────────────────

    /// Push `amount` to `to`, crediting the pull-payment ledger on failure.
    pub fn pay(
        &mut self,
        agreement: &mut Agreement,
        to: Address,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Delivery {
        if amount <= Decimal::ZERO {
            return Delivery::Skipped;
        }
        match self.sink.push(to, amount) {
            Ok(()) => {
                self.books.record_outflow(agreement.id(), amount);
                agreement.record_event(EventKind::PaymentSent { to, amount }, now);
                tracing::debug!(agreement = %agreement.id(), to = %to, amount = %amount, "Payment sent");
                Delivery::Sent
            }
            Err(e) => {
                agreement.payments_mut().credit(to, amount);
                agreement.record_event(EventKind::PaymentCredited { to, amount }, now);
                tracing::warn!(
                    agreement = %agreement.id(),
                    to = %to,
                    amount = %amount,
                    reason = %e,
                    "Push failed, credited as withdrawable"
                );
                Delivery::Credited
            }
        }
    }

    /// Release part of a party's deposit from an inactive agreement.
    pub fn release_deposit(
        &mut self,
        agreement: &mut Agreement,
        party: Address,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Delivery> {
        agreement.release_deposit(party, amount)?;
        agreement.record_event(EventKind::DepositWithdrawn { party, amount }, now);
        let delivery = self.pay(agreement, party, amount, now);
        tracing::info!(
            agreement = %agreement.id(),
            party = %party,
            amount = %amount,
            delivery = ?delivery,
            "Deposit released"
        );
        self.verify(agreement)?;
        Ok(delivery)
    }

    /// Pay out every withdrawable credit `who` holds across `agreements`.
    ///
    /// Balances are zeroed before the push. If the push fails they are
    /// restored and `TransferFailed` is returned.
    ///
    /// # Errors
    /// - `ReentrantCall` if a withdrawal for `who` is already in flight
    /// - `NothingToWithdraw` if `who` holds no credit
    /// - `TransferFailed` if the push is refused
    pub fn withdraw<'a>(
        &mut self,
        agreements: impl IntoIterator<Item = &'a mut Agreement>,
        who: Address,
        now: DateTime<Utc>,
    ) -> Result<Decimal> {
        let in_flight = InFlight::Withdraw(who);
        self.lock.enter(in_flight)?;
        let result = self.withdraw_locked(agreements, who, now);
        self.lock.exit(&in_flight);
        result
    }

    fn withdraw_locked<'a>(
        &mut self,
        agreements: impl IntoIterator<Item = &'a mut Agreement>,
        who: Address,
        now: DateTime<Utc>,
    ) -> Result<Decimal> {
        let mut taken: Vec<(&'a mut Agreement, Decimal)> = Vec::new();
        let mut total = Decimal::ZERO;
        for agreement in agreements {
            let balance = agreement.payments().balance(&who);
            if balance <= Decimal::ZERO {
                continue;
            }
            // Credits that no longer fit one push wait for the next withdrawal.
            let Some(next) = total.checked_add(balance) else {
                break;
            };
            let amount = agreement.payments_mut().take(&who)?;
            total = next;
            taken.push((agreement, amount));
        }
        if total <= Decimal::ZERO {
            return Err(VerdictError::NothingToWithdraw(who));
        }

        if let Err(e) = self.sink.push(who, total) {
            for (agreement, amount) in taken {
                agreement.payments_mut().credit(who, amount);
            }
            tracing::warn!(to = %who, amount = %total, reason = %e, "Withdrawal push failed");
            return Err(VerdictError::TransferFailed {
                to: who,
                reason: e.to_string(),
            });
        }

        for (agreement, amount) in taken {
            self.books.record_outflow(agreement.id(), amount);
            agreement.record_event(EventKind::PaymentWithdrawn { to: who, amount }, now);
            self.verify(agreement)?;
        }
        tracing::info!(to = %who, amount = %total, "Withdrawal complete");
        Ok(total)
    }
}

fn eligible_at(now: DateTime<Utc>, window_secs: u64) -> Result<DateTime<Utc>> {
    i64::try_from(window_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|window| now.checked_add_signed(window))
        .ok_or_else(|| {
            VerdictError::Configuration(format!("appeal window {window_secs}s out of range"))
        })
}
