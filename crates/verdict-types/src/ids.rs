//! Identifiers used throughout Verdict.
//!
//! Accounts and agreements are 20-byte addresses. Bridge messages, oracle
//! origins, dispute references and evidence references are 32-byte digests.
//! Cases are numbered per agreement starting at zero.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account address (party, beneficiary, authority, treasury).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address. Never a valid party or payout target.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address whose every byte is `byte`. Handy for fixtures and configs.
    #[must_use]
    pub fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse a `0x`-prefixed (or bare) 40-character hex string.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).ok()?;
        let arr: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Random address for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    pub fn random() -> Self {
        Self(rand::random::<[u8; 20]>())
    }
}

/// An agreement is identified by its own address.
pub type AgreementId = Address;

// ---------------------------------------------------------------------------
// CaseId
// ---------------------------------------------------------------------------

/// Index of a case inside its agreement. Monotonically increasing from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CaseId(pub u64);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// 32-byte digest identifiers
// ---------------------------------------------------------------------------

macro_rules! digest_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            #[must_use]
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// SHA-256 of an arbitrary label, for deterministic ids.
            #[must_use]
            pub fn from_label(label: &str) -> Self {
                Self(sha256(label.as_bytes()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), hex::encode(&self.0[..8]))
            }
        }
    };
}

digest_id!(
    /// Identifier of a cross-chain bridge message. The replay key of the
    /// bridged delivery path.
    MessageId,
    "msg"
);

digest_id!(
    /// Identifier of the oracle (or bridge lane) that produced a decision.
    OriginId,
    "origin"
);

digest_id!(
    /// Dispute identifier assigned by the reasoning layer.
    DisputeRef,
    "dispute"
);

digest_id!(
    /// Content digest of off-chain evidence. The blob itself is never stored.
    EvidenceRef,
    "evidence"
);

impl EvidenceRef {
    /// Reference for a piece of evidence: SHA-256 of its bytes.
    #[must_use]
    pub fn digest(content: &[u8]) -> Self {
        Self(sha256(content))
    }
}

fn sha256(bytes: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}
