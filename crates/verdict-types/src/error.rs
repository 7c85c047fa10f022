//! Error types for the Verdict settlement engine.
//!
//! All errors use the `VD_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Dispute filing errors
//! - 2xx: Decision admission errors
//! - 3xx: Settlement / enforcement errors
//! - 4xx: Pull-payment errors
//! - 5xx: Agreement ledger errors
//! - 9xx: Configuration / internal errors
//!
//! Every failure is local and synchronous. The engine never retries.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Address, AgreementId, CaseId};

/// Central error enum for all Verdict operations.
#[derive(Debug, Error)]
pub enum VerdictError {
    // =================================================================
    // Dispute Filing Errors (1xx)
    // =================================================================
    /// The account is not one of the agreement's two parties.
    #[error("VD_ERR_100: {0} is not a party to the agreement")]
    NotAParty(Address),

    /// The attached bond is below the bond policy for this claim.
    #[error("VD_ERR_101: Insufficient bond: required {required}, paid {paid}")]
    InsufficientBond { required: Decimal, paid: Decimal },

    /// No case with this id exists in the agreement.
    #[error("VD_ERR_102: Case not found: {agreement} {case_id}")]
    CaseNotFound {
        agreement: AgreementId,
        case_id: CaseId,
    },

    /// An amount was zero or negative where a positive amount is required.
    #[error("VD_ERR_103: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // =================================================================
    // Decision Admission Errors (2xx)
    // =================================================================
    /// Caller is not allowed to use a privileged path.
    #[error("VD_ERR_200: Unauthorized caller {0}")]
    Unauthorized(Address),

    /// A decision with this admission key was already admitted.
    #[error("VD_ERR_201: Decision already processed: {key}")]
    AlreadyProcessed { key: String },

    /// The decision could not be decoded or is structurally invalid.
    #[error("VD_ERR_202: Malformed decision: {reason}")]
    MalformedDecision { reason: String },

    // =================================================================
    // Settlement / Enforcement Errors (3xx)
    // =================================================================
    /// Finalize was attempted before the appeal window elapsed.
    #[error("VD_ERR_300: Appeal window not elapsed for {case_id}: eligible at {eligible_at}")]
    AppealWindowNotElapsed {
        case_id: CaseId,
        eligible_at: chrono::DateTime<chrono::Utc>,
    },

    /// No pending enforcement exists (never created, or already finalized).
    #[error("VD_ERR_301: No pending enforcement for {0}")]
    NoPendingEnforcement(CaseId),

    /// An operation re-entered while the same key was already in flight.
    #[error("VD_ERR_302: Reentrant call rejected: {key}")]
    ReentrantCall { key: String },

    /// Books do not balance after an operation. Critical safety alert.
    #[error("VD_ERR_303: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // Pull-Payment Errors (4xx)
    // =================================================================
    /// The caller has no withdrawable balance.
    #[error("VD_ERR_400: Nothing to withdraw for {0}")]
    NothingToWithdraw(Address),

    /// A withdrawal push failed. The balance was restored.
    #[error("VD_ERR_401: Transfer to {to} failed: {reason}")]
    TransferFailed { to: Address, reason: String },

    // =================================================================
    // Agreement Ledger Errors (5xx)
    // =================================================================
    /// No agreement is registered under this id.
    #[error("VD_ERR_500: Agreement not found: {0}")]
    AgreementNotFound(AgreementId),

    /// An agreement with this id is already registered.
    #[error("VD_ERR_501: Agreement already registered: {0}")]
    DuplicateAgreement(AgreementId),

    /// The agreement has been deactivated, or is still active where
    /// deactivation is required.
    #[error("VD_ERR_502: Agreement {agreement} {reason}")]
    AgreementInactive {
        agreement: AgreementId,
        reason: String,
    },

    /// Deposits cannot be released while cases are unresolved or pending.
    #[error("VD_ERR_503: {0} case(s) still open")]
    OpenCasesRemain(usize),

    /// Not enough deposit to cover a withdrawal.
    #[error("VD_ERR_504: Insufficient deposit: need {needed}, have {available}")]
    InsufficientDeposit { needed: Decimal, available: Decimal },

    // =================================================================
    // Configuration / Internal (9xx)
    // =================================================================
    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("VD_ERR_900: Configuration error: {0}")]
    Configuration(String),

    /// Unrecoverable internal error.
    #[error("VD_ERR_901: Internal error: {0}")]
    Internal(String),
}

impl VerdictError {
    /// Shorthand for a [`VerdictError::MalformedDecision`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDecision {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, VerdictError>;

impl From<serde_json::Error> for VerdictError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
