//! Reporter bond policy — hard gate for dispute filing.
//!
//! ```text
//! required = max(requested * rate_bps / 10_000, minimum)
//! ```
//!
//! The percentage scales with large claims and the floor still applies to
//! tiny ones.

use rust_decimal::Decimal;
use verdict_types::{BondPolicy, Result, VerdictError, constants};

/// Bond required to file a claim of `requested`.
///
/// # Errors
/// `InvalidAmount` if the percentage leaves the `Decimal` range.
pub fn required_bond(policy: &BondPolicy, requested: Decimal) -> Result<Decimal> {
    let percentage = Decimal::from(policy.rate_bps)
        .checked_div(Decimal::from(constants::BPS_DENOMINATOR))
        .and_then(|rate| requested.checked_mul(rate))
        .ok_or_else(|| VerdictError::InvalidAmount {
            reason: format!(
                "bond for requested amount {requested} at {} bps is out of range",
                policy.rate_bps
            ),
        })?;
    Ok(percentage.max(policy.minimum))
}

/// Validate an attached bond. Returns the required amount on success.
///
/// # Errors
/// - `InvalidAmount` if the requirement cannot be computed
/// - `InsufficientBond` if `paid` is below the requirement
pub fn check_bond(policy: &BondPolicy, requested: Decimal, paid: Decimal) -> Result<Decimal> {
    let required = required_bond(policy, requested)?;
    if paid < required {
        return Err(VerdictError::InsufficientBond { required, paid });
    }
    Ok(required)
}
