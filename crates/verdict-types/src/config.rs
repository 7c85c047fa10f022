//! Configuration types for the Verdict engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Result, VerdictError, constants};

/// Reporter bond policy: a percentage of the claim with a fixed floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondPolicy {
    /// Bond as a share of the requested amount, in basis points.
    pub rate_bps: u32,
    /// Floor applied to small claims.
    pub minimum: Decimal,
    /// Denied claims forfeit the bond to the treasury. When false the bond is
    /// returned to the reporter on denial as well.
    #[serde(default = "default_forfeit_on_denial")]
    pub forfeit_on_denial: bool,
}

fn default_forfeit_on_denial() -> bool {
    true
}

impl Default for BondPolicy {
    fn default() -> Self {
        let (mantissa, scale) = constants::DEFAULT_MINIMUM_BOND;
        Self {
            rate_bps: constants::DEFAULT_BOND_RATE_BPS,
            minimum: Decimal::new(mantissa, scale),
            forfeit_on_denial: true,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The only identity allowed on the direct decision path.
    pub settlement_authority: Address,
    /// Receives forfeited and withheld reporter bonds.
    pub treasury: Address,
    /// Bond required to file a dispute.
    #[serde(default)]
    pub bond: BondPolicy,
    /// Longest rationale accepted on either path. Longer ones are rejected.
    #[serde(default = "default_rationale_limit")]
    pub rationale_limit_bytes: usize,
    /// Appeal window given to newly registered agreements when none is set.
    #[serde(default)]
    pub default_appeal_window_secs: u64,
}

fn default_rationale_limit() -> usize {
    constants::MAX_RATIONALE_BYTES
}

impl EngineConfig {
    /// Config with default bond and rationale limits.
    #[must_use]
    pub fn new(settlement_authority: Address, treasury: Address) -> Self {
        Self {
            settlement_authority,
            treasury,
            bond: BondPolicy::default(),
            rationale_limit_bytes: constants::MAX_RATIONALE_BYTES,
            default_appeal_window_secs: constants::DEFAULT_APPEAL_WINDOW_SECS,
        }
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot operate under.
    pub fn validate(&self) -> Result<()> {
        if self.settlement_authority.is_zero() {
            return Err(VerdictError::Configuration(
                "settlement_authority must be set".into(),
            ));
        }
        if self.treasury.is_zero() {
            return Err(VerdictError::Configuration("treasury must be set".into()));
        }
        if self.bond.rate_bps > constants::BPS_DENOMINATOR {
            return Err(VerdictError::Configuration(format!(
                "bond.rate_bps {} exceeds {}",
                self.bond.rate_bps,
                constants::BPS_DENOMINATOR
            )));
        }
        if self.bond.minimum.is_sign_negative() && !self.bond.minimum.is_zero() {
            return Err(VerdictError::Configuration(
                "bond.minimum must not be negative".into(),
            ));
        }
        if self.rationale_limit_bytes == 0 {
            return Err(VerdictError::Configuration(
                "rationale_limit_bytes must be > 0".into(),
            ));
        }
        Ok(())
    }
}
