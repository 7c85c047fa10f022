//! Reporter bond settlement.
//!
//! ```text
//! denied,   forfeit_on_denial   -> everything to treasury
//! denied,   !forfeit_on_denial  -> everything back to reporter
//! approved, reporter is paid and payout < bond
//!                               -> reporter gets bond - payout, rest to treasury
//! approved, otherwise           -> everything back to reporter
//! ```

use rust_decimal::Decimal;

/// How a held bond is split when its case resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondSplit {
    pub refund: Decimal,
    pub forfeit: Decimal,
}

impl BondSplit {
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.refund + self.forfeit
    }
}

/// Split `bond` between the reporter and the treasury.
#[must_use]
pub fn split_bond(
    bond: Decimal,
    approved: bool,
    forfeit_on_denial: bool,
    payout: Decimal,
    reporter_is_beneficiary: bool,
) -> BondSplit {
    if !approved {
        return if forfeit_on_denial {
            BondSplit {
                refund: Decimal::ZERO,
                forfeit: bond,
            }
        } else {
            BondSplit {
                refund: bond,
                forfeit: Decimal::ZERO,
            }
        };
    }
    let refund = if reporter_is_beneficiary && payout < bond {
        bond - payout
    } else {
        bond
    };
    BondSplit {
        refund,
        forfeit: bond - refund,
    }
}
