//! # verdict-ledger
//!
//! Per-agreement state: who holds what, and which disputes exist.
//!
//! ## Components
//!
//! 1. **LedgerStore**: party deposits, escrow, reporter bonds, outstanding judgments
//! 2. **CaseRegistry**: append-only case list with sequential ids
//! 3. **bond_policy**: required-bond gate for filing
//! 4. **PullPayments**: withdrawable credits for failed pushes
//! 5. **PayoutSink**: outbound transfer port
//! 6. **Agreement**: the aggregate owning all of the above plus the
//!    pending-enforcement queue and audit log
//!
//! Only the settlement executor moves money out of an agreement. Parties
//! can only add funds and file disputes.

pub mod agreement;
pub mod bond_policy;
pub mod case_registry;
pub mod ledger_store;
pub mod pull_payment;
pub mod transfer;

pub use agreement::Agreement;
pub use case_registry::{CaseRegistry, NewCase};
pub use ledger_store::{Draw, LedgerStore};
pub use pull_payment::PullPayments;
pub use transfer::{Delivery, PayoutSink, TransferError};

#[cfg(any(test, feature = "test-helpers"))]
pub use transfer::RecordingSink;
