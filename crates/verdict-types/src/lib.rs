//! # verdict-types
//!
//! Shared types, errors, and configuration for the **Verdict** arbitration
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`AgreementId`], [`CaseId`], [`MessageId`], [`OriginId`], [`DisputeRef`], [`EvidenceRef`]
//! - **Case model**: [`Case`], [`CaseState`], [`Enforcement`], [`DisputeKind`]
//! - **Decision model**: [`Decision`], [`AdmissionKey`], [`DeliveryPath`], [`ProcessedDecision`]
//! - **Enforcement model**: [`PayoutPlan`], [`PendingEnforcement`]
//! - **Balances**: [`HeldFunds`], [`AgreementStatus`]
//! - **Audit trail**: [`LedgerEvent`], [`EventKind`]
//! - **Configuration**: [`EngineConfig`], [`BondPolicy`]
//! - **Errors**: [`VerdictError`] with `VD_ERR_` prefix codes
//! - **Money helpers**: base-unit conversion in [`amount`]
//! - **Constants**: system-wide limits and defaults

pub mod amount;
pub mod balance;
pub mod case;
pub mod config;
pub mod constants;
pub mod decision;
pub mod enforcement;
pub mod error;
pub mod event;
pub mod ids;

// Re-export all primary types at crate root for ergonomic imports:
//   use verdict_types::{Case, Decision, PayoutPlan, ...};

pub use balance::*;
pub use case::*;
pub use config::*;
pub use decision::*;
pub use enforcement::*;
pub use error::*;
pub use event::*;
pub use ids::*;

// Constants and amount helpers are accessed via their module path
// (not re-exported to avoid name collisions).
