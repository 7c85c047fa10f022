//! Money helpers.
//!
//! Ledger amounts are [`Decimal`] whole units. The bridged wire format carries
//! unsigned integers in base units with [`AMOUNT_DECIMALS`] decimals. Both
//! conversions are exact or fail: nothing is rounded on the way in or out.

use rust_decimal::Decimal;

use crate::constants::AMOUNT_DECIMALS;
use crate::{Result, VerdictError};

/// Convert base units (e.g. wei) into a whole-unit amount.
///
/// Returns `None` if the value does not fit a [`Decimal`] mantissa.
#[must_use]
pub fn from_base_units(units: u128) -> Option<Decimal> {
    let signed = i128::try_from(units).ok()?;
    let mut amount = Decimal::try_from_i128_with_scale(signed, AMOUNT_DECIMALS).ok()?;
    amount.normalize_assign();
    Some(amount)
}

/// Convert a whole-unit amount into base units.
///
/// Returns `None` for negative amounts, for amounts with more than
/// [`AMOUNT_DECIMALS`] decimal places, and on overflow.
#[must_use]
pub fn to_base_units(amount: Decimal) -> Option<u128> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }
    let factor = Decimal::from_i128_with_scale(10_i128.pow(AMOUNT_DECIMALS), 0);
    let scaled = amount.checked_mul(factor)?;
    if !scaled.fract().is_zero() {
        return None;
    }
    let whole = scaled.normalize();
    if whole.scale() != 0 {
        return None;
    }
    u128::try_from(whole.mantissa()).ok()
}

/// Require `amount > 0`.
pub fn ensure_positive(amount: Decimal, what: &str) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(VerdictError::InvalidAmount {
            reason: format!("{what} must be positive, got {amount}"),
        });
    }
    Ok(())
}

/// Require `amount >= 0`.
pub fn ensure_non_negative(amount: Decimal, what: &str) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(VerdictError::InvalidAmount {
            reason: format!("{what} must not be negative, got {amount}"),
        });
    }
    Ok(())
}

/// `a + b`, or `InvalidAmount` if the sum leaves the `Decimal` range.
pub fn checked_add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal> {
    a.checked_add(b).ok_or_else(|| VerdictError::InvalidAmount {
        reason: format!("{what} overflows: {a} + {b}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_reports_overflow() {
        assert_eq!(
            checked_add(Decimal::ONE, Decimal::TWO, "deposit").unwrap(),
            Decimal::new(3, 0)
        );
        let err = checked_add(Decimal::MAX, Decimal::ONE, "deposit").unwrap_err();
        assert!(matches!(err, VerdictError::InvalidAmount { .. }));
        assert!(err.to_string().contains("deposit overflows"));
    }

    #[test]
    fn one_ether_in_wei() {
        assert_eq!(to_base_units(Decimal::ONE), Some(1_000_000_000_000_000_000));
        assert_eq!(
            from_base_units(1_000_000_000_000_000_000),
            Some(Decimal::ONE)
        );
    }

    #[test]
    fn fractional_amounts_convert_exactly() {
        let amount = Decimal::new(5, 1); // 0.5
        let units = to_base_units(amount).unwrap();
        assert_eq!(units, 500_000_000_000_000_000);
        assert_eq!(from_base_units(units), Some(amount));
    }

    #[test]
    fn one_wei() {
        let wei = from_base_units(1).unwrap();
        assert_eq!(wei, Decimal::new(1, 18));
        assert_eq!(to_base_units(wei), Some(1));
    }

    #[test]
    fn negative_and_overprecise_rejected() {
        assert_eq!(to_base_units(Decimal::NEGATIVE_ONE), None);
        assert_eq!(to_base_units(Decimal::new(1, 19)), None);
    }

    #[test]
    fn oversized_base_units_rejected() {
        assert_eq!(from_base_units(u128::MAX), None);
    }

    #[test]
    fn positivity_guards() {
        assert!(ensure_positive(Decimal::ONE, "x").is_ok());
        assert!(ensure_positive(Decimal::ZERO, "x").is_err());
        assert!(ensure_non_negative(Decimal::ZERO, "x").is_ok());
        assert!(ensure_non_negative(Decimal::NEGATIVE_ONE, "x").is_err());
    }
}
