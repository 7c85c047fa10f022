//! Decision admission gate — exactly-once admission across delivery paths.
//!
//! Each path derives its own key:
//! - direct:  `(agreement, case_id)`, caller must be the settlement authority
//! - bridged: the bridge `MessageId` alone, whoever relays it
//!
//! Both paths end in the same [`AdmissionGate::admit`] primitive, which
//! records a permanent [`ProcessedDecision`]. Records are never evicted: a
//! key that was admitted once can never be admitted again, even if the
//! settlement that followed it failed.
//!
//! Checking and recording are separate steps so the caller can verify the
//! target case between them. Nothing here touches balances.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use verdict_types::{
    Address, AdmissionKey, AgreementId, CaseId, Decision, MessageId, ProcessedDecision, Result,
    VerdictError, amount as money,
};

use crate::codec;

/// A decision that passed validation and the replay check, not yet recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: AdmissionKey,
    pub decision: Decision,
}

/// Permanent record of admitted decisions.
pub struct AdmissionGate {
    settlement_authority: Address,
    rationale_limit: usize,
    processed: HashMap<AdmissionKey, ProcessedDecision>,
}

impl AdmissionGate {
    #[must_use]
    pub fn new(settlement_authority: Address, rationale_limit: usize) -> Self {
        Self {
            settlement_authority,
            rationale_limit,
            processed: HashMap::new(),
        }
    }

    #[must_use]
    pub fn settlement_authority(&self) -> Address {
        self.settlement_authority
    }

    /// Validate a direct decision from `caller`.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is the settlement authority
    /// - `AlreadyProcessed` if `(agreement, case_id)` was admitted before
    /// - `MalformedDecision` for structural problems
    pub fn check_direct(&self, decision: Decision, caller: Address) -> Result<Candidate> {
        if caller != self.settlement_authority {
            tracing::warn!(caller = %caller, "Direct decision from unauthorized caller");
            return Err(VerdictError::Unauthorized(caller));
        }
        let key = AdmissionKey::Case(decision.agreement, decision.case_id);
        self.ensure_unprocessed(&key)?;
        self.validate(&decision)?;
        Ok(Candidate { key, decision })
    }

    /// Decode and validate a bridged payload.
    ///
    /// The replay check runs before decoding, so a replayed message fails
    /// with `AlreadyProcessed` even if its payload differs.
    ///
    /// # Errors
    /// - `AlreadyProcessed` if `message_id` was admitted before
    /// - `MalformedDecision` if the payload does not decode, or its embedded
    ///   target and case disagree with the route
    pub fn check_bridged(
        &self,
        message_id: MessageId,
        agreement: AgreementId,
        case_id: CaseId,
        payload: &[u8],
    ) -> Result<Candidate> {
        let key = AdmissionKey::Message(message_id);
        self.ensure_unprocessed(&key)?;
        let decision = codec::decode_decision(payload, self.rationale_limit)?;
        if decision.agreement != agreement {
            return Err(VerdictError::malformed(format!(
                "payload targets {}, routed to {agreement}",
                decision.agreement
            )));
        }
        if decision.case_id != case_id {
            return Err(VerdictError::malformed(format!(
                "payload is for {}, routed for {case_id}",
                decision.case_id
            )));
        }
        self.validate(&decision)?;
        Ok(Candidate { key, decision })
    }

    /// Record `key` as admitted for `decision`. The single write path shared
    /// by both delivery routes.
    ///
    /// # Errors
    /// `AlreadyProcessed` if the key already has a record.
    pub fn admit(
        &mut self,
        key: AdmissionKey,
        decision: &Decision,
        now: DateTime<Utc>,
    ) -> Result<ProcessedDecision> {
        self.ensure_unprocessed(&key)?;
        let record = ProcessedDecision {
            key,
            agreement: decision.agreement,
            case_id: decision.case_id,
            origin: decision.origin,
            admitted_at: now,
        };
        self.processed.insert(key, record.clone());
        tracing::info!(
            key = %key,
            path = %key.path(),
            agreement = %decision.agreement,
            case = decision.case_id.0,
            origin = %decision.origin,
            "Decision admitted"
        );
        Ok(record)
    }

    #[must_use]
    pub fn is_processed(&self, key: &AdmissionKey) -> bool {
        self.processed.contains_key(key)
    }

    #[must_use]
    pub fn record(&self, key: &AdmissionKey) -> Option<&ProcessedDecision> {
        self.processed.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    fn ensure_unprocessed(&self, key: &AdmissionKey) -> Result<()> {
        if self.processed.contains_key(key) {
            tracing::warn!(key = %key, path = %key.path(), "Replay rejected");
            return Err(VerdictError::AlreadyProcessed {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn validate(&self, decision: &Decision) -> Result<()> {
        if decision.rationale.len() > self.rationale_limit {
            return Err(VerdictError::malformed(format!(
                "rationale is {} bytes, limit {}",
                decision.rationale.len(),
                self.rationale_limit
            )));
        }
        money::ensure_non_negative(decision.applied_amount, "applied amount")
            .map_err(|e| VerdictError::malformed(e.to_string()))?;
        if decision.approved && decision.beneficiary.is_zero() {
            return Err(VerdictError::malformed(
                "approved decision has no beneficiary",
            ));
        }
        Ok(())
    }
}
