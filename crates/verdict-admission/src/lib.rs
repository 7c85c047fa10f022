//! # verdict-admission
//!
//! Validates incoming arbitration decisions and admits each one exactly once.
//!
//! - [`codec`]: strict decoder (and encoder) for the bridged binary payload
//! - [`AdmissionGate`]: authority check, replay protection, permanent
//!   processed-decision records
//!
//! This crate is pure: it never touches balances. A rejected admission
//! leaves every ledger untouched.

pub mod codec;
pub mod gate;

pub use codec::{decode_decision, encode_decision};
pub use gate::{AdmissionGate, Candidate};
