//! # verdict-settlement
//!
//! Fund movement for admitted arbitration decisions.
//!
//! ## Architecture
//!
//! The settlement layer receives an admitted [`Decision`](verdict_types::Decision) and:
//! 1. Plans the payout (deposit first, then escrow, shortfall carried over)
//! 2. Resolves the case, immediately or as pending enforcement
//! 3. Pushes funds, falling back to a withdrawable credit on failure
//! 4. Settles the reporter bond
//! 5. Checks conservation per agreement
//!
//! [`ArbitrationEngine`] ties this to the ledger and the admission gate.

pub mod bond;
pub mod conservation;
pub mod engine;
pub mod executor;
pub mod reentrancy;

pub use bond::{BondSplit, split_bond};
pub use conservation::Conservation;
pub use engine::ArbitrationEngine;
pub use executor::{SettlementExecutor, SettlementOutcome};
pub use reentrancy::{InFlight, SettlementLock};
