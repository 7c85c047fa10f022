//! In-flight operation lock.
//!
//! A withdrawal for an address, or a settlement for a case, holds a lock
//! entry while its transfer is outstanding. A second attempt on the same
//! key while the first is in flight is rejected with `ReentrantCall`
//! rather than allowed to interleave.

use std::collections::HashSet;
use std::fmt;

use verdict_types::{Address, AgreementId, CaseId, Result, VerdictError};

/// What is being locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InFlight {
    Withdraw(Address),
    Case(AgreementId, CaseId),
}

impl fmt::Display for InFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Withdraw(who) => write!(f, "withdraw:{who}"),
            Self::Case(agreement, case_id) => write!(f, "settle:{agreement}/{case_id}"),
        }
    }
}

/// Set of operations currently in flight.
///
/// The executor takes `&mut self`, so a sink cannot call back into it while
/// a transfer is outstanding. The lock covers settle, finalize and withdraw
/// for the case where the executor is shared behind a handle that hands out
/// access per call.
#[derive(Debug, Default)]
pub struct SettlementLock {
    held: HashSet<InFlight>,
}

impl SettlementLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `key`.
    ///
    /// # Errors
    /// `ReentrantCall` if `key` is already held.
    pub fn enter(&mut self, key: InFlight) -> Result<()> {
        if !self.held.insert(key) {
            tracing::warn!(key = %key, "Reentrant call rejected");
            return Err(VerdictError::ReentrantCall {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Release the lock for `key`.
    pub fn exit(&mut self, key: &InFlight) {
        self.held.remove(key);
    }

    #[must_use]
    pub fn is_held(&self, key: &InFlight) -> bool {
        self.held.contains(key)
    }
}
