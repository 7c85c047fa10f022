//! Per-agreement fund pools.
//!
//! Tracks party deposits, the escrow balance, per-case reporter bonds and
//! per-case outstanding judgments. All mutations are atomic: either the full
//! operation succeeds or the store is unchanged.

use std::collections::HashMap;

use rust_decimal::Decimal;
use verdict_types::{Address, CaseId, Result, VerdictError, amount as money};

/// How much of a draw came from each pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub from_deposit: Decimal,
    pub from_escrow: Decimal,
}

impl Draw {
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.from_deposit + self.from_escrow
    }
}

/// Balances for one agreement.
///
/// The store is the source of truth for money inside an agreement. Only the
/// settlement executor draws from it; parties can only add.
pub struct LedgerStore {
    parties: [Address; 2],
    /// Per-party security deposits.
    deposits: HashMap<Address, Decimal>,
    /// General operational fund (rent, fees).
    escrow: Decimal,
    /// Bonds posted by reporters, held until their case settles.
    bonds: HashMap<CaseId, Decimal>,
    /// Unfunded remainder of approved awards.
    outstanding: HashMap<CaseId, Decimal>,
}

impl LedgerStore {
    /// Create an empty store for two distinct, non-zero parties.
    ///
    /// # Errors
    /// `NotAParty` if a party is the zero address or both are the same.
    pub fn new(party_a: Address, party_b: Address) -> Result<Self> {
        if party_a.is_zero() {
            return Err(VerdictError::NotAParty(party_a));
        }
        if party_b.is_zero() || party_b == party_a {
            return Err(VerdictError::NotAParty(party_b));
        }
        Ok(Self {
            parties: [party_a, party_b],
            deposits: HashMap::new(),
            escrow: Decimal::ZERO,
            bonds: HashMap::new(),
            outstanding: HashMap::new(),
        })
    }

    #[must_use]
    pub fn parties(&self) -> [Address; 2] {
        self.parties
    }

    #[must_use]
    pub fn is_party(&self, who: &Address) -> bool {
        self.parties.contains(who)
    }

    /// Fails with `NotAParty` for strangers.
    pub fn ensure_party(&self, who: &Address) -> Result<()> {
        if self.is_party(who) {
            Ok(())
        } else {
            Err(VerdictError::NotAParty(*who))
        }
    }

    /// Add to a party's security deposit.
    ///
    /// # Errors
    /// `NotAParty`, or `InvalidAmount` for a non-positive amount or one that
    /// would overflow the deposit.
    pub fn deposit(&mut self, party: Address, amount: Decimal) -> Result<()> {
        self.ensure_party(&party)?;
        money::ensure_positive(amount, "deposit")?;
        let updated = money::checked_add(self.party_deposit(&party), amount, "deposit")?;
        self.deposits.insert(party, updated);
        Ok(())
    }

    /// Add to the escrow balance.
    ///
    /// # Errors
    /// `InvalidAmount` for a non-positive amount or one that would overflow
    /// the escrow balance.
    pub fn fund_escrow(&mut self, amount: Decimal) -> Result<()> {
        money::ensure_positive(amount, "escrow funding")?;
        self.escrow = money::checked_add(self.escrow, amount, "escrow")?;
        Ok(())
    }

    #[must_use]
    pub fn party_deposit(&self, party: &Address) -> Decimal {
        self.deposits.get(party).copied().unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn escrow(&self) -> Decimal {
        self.escrow
    }

    /// Funds that can back an award against `offender`: their deposit plus
    /// the escrow balance.
    #[must_use]
    pub fn available_against(&self, offender: &Address) -> Decimal {
        self.party_deposit(offender).saturating_add(self.escrow)
    }

    /// Split `amount` across the offender's deposit first, then escrow,
    /// without mutating anything.
    ///
    /// # Errors
    /// `InsufficientDeposit` if both pools together cannot cover `amount`.
    pub fn plan_draw(&self, offender: &Address, amount: Decimal) -> Result<Draw> {
        money::ensure_non_negative(amount, "draw")?;
        let available = self.available_against(offender);
        if amount > available {
            return Err(VerdictError::InsufficientDeposit {
                needed: amount,
                available,
            });
        }
        let from_deposit = amount.min(self.party_deposit(offender));
        Ok(Draw {
            from_deposit,
            from_escrow: amount - from_deposit,
        })
    }

    /// Deduct `amount` from deposit first, then escrow.
    pub fn draw(&mut self, offender: &Address, amount: Decimal) -> Result<Draw> {
        let draw = self.plan_draw(offender, amount)?;
        if draw.from_deposit > Decimal::ZERO {
            if let Some(dep) = self.deposits.get_mut(offender) {
                *dep -= draw.from_deposit;
            }
        }
        self.escrow -= draw.from_escrow;
        Ok(draw)
    }

    /// Remove part of a party's own deposit (released back to them).
    ///
    /// # Errors
    /// `InsufficientDeposit` if the deposit is smaller than `amount`.
    pub fn debit_deposit(&mut self, party: &Address, amount: Decimal) -> Result<()> {
        money::ensure_positive(amount, "deposit withdrawal")?;
        let available = self.party_deposit(party);
        if available < amount {
            return Err(VerdictError::InsufficientDeposit {
                needed: amount,
                available,
            });
        }
        *self.deposits.entry(*party).or_insert(Decimal::ZERO) -= amount;
        Ok(())
    }

    /// Hold a reporter bond against a case.
    ///
    /// # Errors
    /// `InvalidAmount` if the case's bond would overflow.
    pub fn hold_bond(&mut self, case_id: CaseId, amount: Decimal) -> Result<()> {
        let updated = money::checked_add(self.bond(case_id), amount, "bond")?;
        self.bonds.insert(case_id, updated);
        Ok(())
    }

    /// Release a case's bond, zeroing it. Returns the amount released.
    pub fn take_bond(&mut self, case_id: CaseId) -> Decimal {
        self.bonds.remove(&case_id).unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn bond(&self, case_id: CaseId) -> Decimal {
        self.bonds.get(&case_id).copied().unwrap_or(Decimal::ZERO)
    }

    /// Record the unfunded remainder of an award. Zero amounts are not stored.
    pub fn record_outstanding(&mut self, case_id: CaseId, amount: Decimal) {
        if amount > Decimal::ZERO {
            self.outstanding.insert(case_id, amount);
        }
    }

    #[must_use]
    pub fn outstanding(&self, case_id: CaseId) -> Decimal {
        self.outstanding
            .get(&case_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of all outstanding judgments, saturating at `Decimal::MAX`.
    /// Judgments are unfunded, so nothing bounds their total.
    #[must_use]
    pub fn total_outstanding(&self) -> Decimal {
        self.outstanding
            .values()
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
    }

    #[must_use]
    pub fn total_deposits(&self) -> Decimal {
        self.deposits.values().copied().sum()
    }

    #[must_use]
    pub fn total_bonds(&self) -> Decimal {
        self.bonds.values().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(mantissa: i64, scale: u32) -> Decimal {
        Decimal::new(mantissa, scale)
    }

    fn store() -> (LedgerStore, Address, Address) {
        let landlord = Address::repeat_byte(1);
        let tenant = Address::repeat_byte(2);
        (LedgerStore::new(landlord, tenant).unwrap(), landlord, tenant)
    }

    #[test]
    fn parties_must_be_distinct_and_non_zero() {
        let a = Address::repeat_byte(1);
        assert!(matches!(
            LedgerStore::new(a, a),
            Err(VerdictError::NotAParty(_))
        ));
        assert!(LedgerStore::new(Address::ZERO, a).is_err());
        assert!(LedgerStore::new(a, Address::ZERO).is_err());
    }

    #[test]
    fn deposit_only_for_parties() {
        let (mut s, _, tenant) = store();
        s.deposit(tenant, dec(5, 1)).unwrap();
        assert_eq!(s.party_deposit(&tenant), dec(5, 1));

        let err = s.deposit(Address::repeat_byte(9), Decimal::ONE).unwrap_err();
        assert!(matches!(err, VerdictError::NotAParty(_)));
    }

    #[test]
    fn non_positive_funding_rejected() {
        let (mut s, _, tenant) = store();
        assert!(s.deposit(tenant, Decimal::ZERO).is_err());
        assert!(s.fund_escrow(Decimal::NEGATIVE_ONE).is_err());
        assert_eq!(s.escrow(), Decimal::ZERO);
    }

    #[test]
    fn draw_consumes_deposit_before_escrow() {
        let (mut s, _, tenant) = store();
        s.deposit(tenant, dec(5, 1)).unwrap();
        s.fund_escrow(dec(3, 1)).unwrap();

        let draw = s.draw(&tenant, dec(6, 1)).unwrap();
        assert_eq!(draw.from_deposit, dec(5, 1));
        assert_eq!(draw.from_escrow, dec(1, 1));
        assert_eq!(draw.total(), dec(6, 1));
        assert_eq!(s.party_deposit(&tenant), Decimal::ZERO);
        assert_eq!(s.escrow(), dec(2, 1));
    }

    #[test]
    fn draw_beyond_available_fails_without_mutation() {
        let (mut s, _, tenant) = store();
        s.deposit(tenant, dec(2, 1)).unwrap();
        let err = s.draw(&tenant, Decimal::ONE).unwrap_err();
        assert!(matches!(err, VerdictError::InsufficientDeposit { .. }));
        assert_eq!(s.party_deposit(&tenant), dec(2, 1));
    }

    #[test]
    fn draw_ignores_other_party_deposit() {
        let (mut s, landlord, tenant) = store();
        s.deposit(landlord, Decimal::ONE).unwrap();
        assert_eq!(s.available_against(&tenant), Decimal::ZERO);
        assert!(s.draw(&tenant, dec(1, 1)).is_err());
    }

    #[test]
    fn bonds_are_taken_once() {
        let (mut s, _, _) = store();
        s.hold_bond(CaseId(0), dec(1, 2)).unwrap();
        assert_eq!(s.bond(CaseId(0)), dec(1, 2));
        assert_eq!(s.total_bonds(), dec(1, 2));
        assert_eq!(s.take_bond(CaseId(0)), dec(1, 2));
        assert_eq!(s.take_bond(CaseId(0)), Decimal::ZERO);
    }

    #[test]
    fn outstanding_zero_not_stored() {
        let (mut s, _, _) = store();
        s.record_outstanding(CaseId(0), Decimal::ZERO);
        s.record_outstanding(CaseId(1), Decimal::ONE);
        assert_eq!(s.outstanding(CaseId(0)), Decimal::ZERO);
        assert_eq!(s.outstanding(CaseId(1)), Decimal::ONE);
        assert_eq!(s.total_outstanding(), Decimal::ONE);
    }

    #[test]
    fn debit_deposit_checks_balance() {
        let (mut s, landlord, _) = store();
        s.deposit(landlord, dec(5, 1)).unwrap();
        s.debit_deposit(&landlord, dec(4, 1)).unwrap();
        assert_eq!(s.party_deposit(&landlord), dec(1, 1));
        let err = s.debit_deposit(&landlord, dec(4, 1)).unwrap_err();
        assert!(matches!(err, VerdictError::InsufficientDeposit { .. }));
        assert_eq!(s.total_deposits(), dec(1, 1));
    }

    #[test]
    fn deposit_overflow_rejected_without_change() {
        let (mut s, landlord, _) = store();
        s.deposit(landlord, Decimal::MAX).unwrap();
        let err = s.deposit(landlord, Decimal::ONE).unwrap_err();
        assert!(matches!(err, VerdictError::InvalidAmount { .. }));
        assert_eq!(s.party_deposit(&landlord), Decimal::MAX);
    }

    #[test]
    fn escrow_overflow_rejected_without_change() {
        let (mut s, _, _) = store();
        s.fund_escrow(Decimal::MAX).unwrap();
        let err = s.fund_escrow(Decimal::ONE).unwrap_err();
        assert!(matches!(err, VerdictError::InvalidAmount { .. }));
        assert_eq!(s.escrow(), Decimal::MAX);
    }

    #[test]
    fn bond_overflow_rejected_without_change() {
        let (mut s, _, _) = store();
        s.hold_bond(CaseId(0), Decimal::MAX).unwrap();
        let err = s.hold_bond(CaseId(0), Decimal::ONE).unwrap_err();
        assert!(matches!(err, VerdictError::InvalidAmount { .. }));
        assert_eq!(s.bond(CaseId(0)), Decimal::MAX);
    }

    #[test]
    fn full_pools_saturate_availability() {
        let (mut s, _, tenant) = store();
        s.deposit(tenant, Decimal::MAX).unwrap();
        s.fund_escrow(Decimal::MAX).unwrap();
        assert_eq!(s.available_against(&tenant), Decimal::MAX);
        let draw = s.draw(&tenant, Decimal::MAX).unwrap();
        assert_eq!(draw.from_deposit, Decimal::MAX);
        assert_eq!(draw.from_escrow, Decimal::ZERO);
        s.record_outstanding(CaseId(0), Decimal::MAX);
        s.record_outstanding(CaseId(1), Decimal::MAX);
        assert_eq!(s.total_outstanding(), Decimal::MAX);
    }
}
