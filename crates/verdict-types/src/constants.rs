//! System-wide constants for the Verdict settlement engine.

/// Decimal places of the integer base unit used on the bridged wire format.
pub const AMOUNT_DECIMALS: u32 = 18;

/// Default reporter bond rate in basis points (50 bps = 0.5% of the claim).
pub const DEFAULT_BOND_RATE_BPS: u32 = 50;

/// Default bond floor, expressed as (mantissa, scale): 0.001.
pub const DEFAULT_MINIMUM_BOND: (i64, u32) = (1, 3);

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Longest rationale accepted on either delivery path, in bytes.
pub const MAX_RATIONALE_BYTES: usize = 4096;

/// Default appeal window. Zero means immediate enforcement.
pub const DEFAULT_APPEAL_WINDOW_SECS: u64 = 0;

/// Size of one word in the bridged payload layout.
pub const WORD_BYTES: usize = 32;

/// Number of head words in the bridged decision tuple.
pub const DECISION_HEAD_WORDS: usize = 9;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Verdict";
