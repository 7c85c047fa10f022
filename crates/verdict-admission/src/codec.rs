//! Bridged decision payload codec.
//!
//! A bridged decision arrives as one ABI-encoded tuple with a single dynamic
//! member (the rationale):
//!
//! ```text
//! word 0         offset of the tuple            == 0x20
//! tuple head     9 words:
//!   0  dispute_ref      bytes32
//!   1  approved         bool      (0 or 1, nothing else)
//!   2  applied_amount   uint256   base units, 18 decimals
//!   3  beneficiary      address   (high 12 bytes zero)
//!   4  rationale        offset    == 9 * 32, relative to the tuple
//!   5  origin           bytes32
//!   6  timestamp        uint256   unix seconds
//!   7  target           address   the agreement
//!   8  case_id          uint256
//! tail           length word, then UTF-8 bytes zero-padded to 32
//! ```
//!
//! Decoding is strict: every length, offset and padding byte is checked and
//! the payload must end exactly where the layout says. Nothing is coerced.

use chrono::{DateTime, Utc};
use verdict_types::{
    Address, CaseId, Decision, DisputeRef, OriginId, Result, VerdictError, amount as money,
    constants::{DECISION_HEAD_WORDS, WORD_BYTES},
};

type Word = [u8; WORD_BYTES];

const TUPLE_OFFSET: usize = WORD_BYTES;
const RATIONALE_OFFSET: usize = DECISION_HEAD_WORDS * WORD_BYTES;

/// Byte length of an encoded decision whose rationale is `rationale_len` bytes.
#[must_use]
pub fn encoded_len(rationale_len: usize) -> usize {
    TUPLE_OFFSET + RATIONALE_OFFSET + WORD_BYTES + padded_len(rationale_len)
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD_BYTES) * WORD_BYTES
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a decision in the bridged layout.
///
/// # Errors
/// `MalformedDecision` if the amount is negative or finer than 18 decimals,
/// or the timestamp predates the unix epoch.
pub fn encode_decision(decision: &Decision) -> Result<Vec<u8>> {
    let units = money::to_base_units(decision.applied_amount).ok_or_else(|| {
        VerdictError::malformed(format!(
            "applied amount {} is not representable in base units",
            decision.applied_amount
        ))
    })?;
    let secs = u64::try_from(decision.timestamp.timestamp())
        .map_err(|_| VerdictError::malformed("timestamp before unix epoch"))?;
    let rationale = decision.rationale.as_bytes();

    let mut out = Vec::with_capacity(encoded_len(rationale.len()));
    out.extend_from_slice(&uint_word(TUPLE_OFFSET as u128));
    out.extend_from_slice(decision.dispute_ref.as_bytes());
    out.extend_from_slice(&uint_word(u128::from(decision.approved)));
    out.extend_from_slice(&uint_word(units));
    out.extend_from_slice(&address_word(&decision.beneficiary));
    out.extend_from_slice(&uint_word(RATIONALE_OFFSET as u128));
    out.extend_from_slice(decision.origin.as_bytes());
    out.extend_from_slice(&uint_word(u128::from(secs)));
    out.extend_from_slice(&address_word(&decision.agreement));
    out.extend_from_slice(&uint_word(u128::from(decision.case_id.0)));
    out.extend_from_slice(&uint_word(rationale.len() as u128));
    out.extend_from_slice(rationale);
    out.resize(encoded_len(rationale.len()), 0);
    Ok(out)
}

fn uint_word(value: u128) -> Word {
    let mut word = [0u8; WORD_BYTES];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &Address) -> Word {
    let mut word = [0u8; WORD_BYTES];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a bridged payload into a [`Decision`].
///
/// `agreement` and `case_id` of the result come from the payload itself;
/// the admission gate compares them against the delivery route.
///
/// # Errors
/// `MalformedDecision` for truncated or trailing bytes, bad offsets,
/// non-canonical booleans or addresses, out-of-range integers, invalid
/// UTF-8, dirty padding, or a rationale longer than `rationale_limit` bytes.
pub fn decode_decision(payload: &[u8], rationale_limit: usize) -> Result<Decision> {
    let mut input = payload;

    let tuple_offset = read_usize(&mut input, "tuple offset")?;
    if tuple_offset != TUPLE_OFFSET {
        return Err(VerdictError::malformed(format!(
            "tuple offset {tuple_offset}, expected {TUPLE_OFFSET}"
        )));
    }

    let dispute_ref = DisputeRef::from_bytes(read_word(&mut input, "dispute_ref")?);
    let approved = read_bool(&mut input)?;
    let units = read_u128(&mut input, "applied_amount")?;
    let beneficiary = read_address(&mut input, "beneficiary")?;
    let rationale_offset = read_usize(&mut input, "rationale offset")?;
    if rationale_offset != RATIONALE_OFFSET {
        return Err(VerdictError::malformed(format!(
            "rationale offset {rationale_offset}, expected {RATIONALE_OFFSET}"
        )));
    }
    let origin = OriginId::from_bytes(read_word(&mut input, "origin")?);
    let secs = read_u128(&mut input, "timestamp")?;
    let agreement = read_address(&mut input, "target")?;
    let case_id = read_u128(&mut input, "case_id")?;

    let rationale_len = read_usize(&mut input, "rationale length")?;
    if rationale_len > rationale_limit {
        return Err(VerdictError::malformed(format!(
            "rationale is {rationale_len} bytes, limit {rationale_limit}"
        )));
    }
    let rationale = read_string(&mut input, rationale_len)?;
    if !input.is_empty() {
        return Err(VerdictError::malformed(format!(
            "{} trailing bytes after rationale",
            input.len()
        )));
    }

    let applied_amount = money::from_base_units(units)
        .ok_or_else(|| VerdictError::malformed("applied_amount out of range"))?;
    let timestamp = i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .ok_or_else(|| VerdictError::malformed("timestamp out of range"))?;
    let case_id = u64::try_from(case_id)
        .map(CaseId)
        .map_err(|_| VerdictError::malformed("case_id out of range"))?;

    Ok(Decision {
        agreement,
        case_id,
        dispute_ref,
        approved,
        applied_amount,
        beneficiary,
        rationale,
        origin,
        timestamp,
    })
}

fn read_word(input: &mut &[u8], field: &str) -> Result<Word> {
    let (word, rest) = input
        .split_first_chunk::<WORD_BYTES>()
        .ok_or_else(|| VerdictError::malformed(format!("truncated at {field}")))?;
    *input = rest;
    Ok(*word)
}

/// A uint256 that must fit in 128 bits.
fn read_u128(input: &mut &[u8], field: &str) -> Result<u128> {
    let word = read_word(input, field)?;
    let (high, low) = word.split_at(16);
    if high.iter().any(|b| *b != 0) {
        return Err(VerdictError::malformed(format!("{field} overflows")));
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(low);
    Ok(u128::from_be_bytes(bytes))
}

fn read_usize(input: &mut &[u8], field: &str) -> Result<usize> {
    let value = read_u128(input, field)?;
    usize::try_from(value).map_err(|_| VerdictError::malformed(format!("{field} overflows")))
}

fn read_bool(input: &mut &[u8]) -> Result<bool> {
    match read_u128(input, "approved")? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(VerdictError::malformed(format!(
            "approved must be 0 or 1, got {other}"
        ))),
    }
}

fn read_address(input: &mut &[u8], field: &str) -> Result<Address> {
    let word = read_word(input, field)?;
    let (high, low) = word.split_at(12);
    if high.iter().any(|b| *b != 0) {
        return Err(VerdictError::malformed(format!(
            "{field} has dirty high bytes"
        )));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(low);
    Ok(Address::from_bytes(bytes))
}

fn read_string(input: &mut &[u8], len: usize) -> Result<String> {
    let padded = padded_len(len);
    if input.len() < padded {
        return Err(VerdictError::malformed(format!(
            "truncated rationale: need {padded} bytes, have {}",
            input.len()
        )));
    }
    let (data, rest) = input.split_at(padded);
    *input = rest;
    let (text, padding) = data.split_at(len);
    if padding.iter().any(|b| *b != 0) {
        return Err(VerdictError::malformed("non-zero rationale padding"));
    }
    String::from_utf8(text.to_vec())
        .map_err(|_| VerdictError::malformed("rationale is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use verdict_types::constants::MAX_RATIONALE_BYTES;

    fn decision(rationale: &str) -> Decision {
        Decision {
            agreement: Address::repeat_byte(0xa1),
            case_id: CaseId(0),
            dispute_ref: DisputeRef::from_label("d2"),
            approved: true,
            applied_amount: Decimal::new(2, 2),
            beneficiary: Address::repeat_byte(0x11),
            rationale: rationale.to_string(),
            origin: OriginId::from_label("oracleX"),
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    fn word_at(bytes: &[u8], index: usize) -> &[u8] {
        &bytes[index * WORD_BYTES..(index + 1) * WORD_BYTES]
    }

    #[test]
    fn layout_matches_abi_tuple() {
        let bytes = encode_decision(&decision("ok")).unwrap();
        assert_eq!(bytes.len(), encoded_len(2));
        assert_eq!(bytes.len(), 32 + 9 * 32 + 32 + 32);
        assert_eq!(word_at(&bytes, 0)[31], 0x20);
        // approved
        assert_eq!(word_at(&bytes, 2)[31], 1);
        // rationale offset = 288 = 0x0120
        assert_eq!(&word_at(&bytes, 5)[30..], &[0x01, 0x20]);
        // length word, then "ok"
        assert_eq!(word_at(&bytes, 10)[31], 2);
        assert_eq!(&word_at(&bytes, 11)[..2], b"ok");
    }

    #[test]
    fn decode_reads_back_every_field() {
        let original = decision("tenant damaged the carpet");
        let bytes = encode_decision(&original).unwrap();
        let decoded = decode_decision(&bytes, MAX_RATIONALE_BYTES).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn empty_rationale_has_no_tail_words() {
        let bytes = encode_decision(&decision("")).unwrap();
        assert_eq!(bytes.len(), 32 + 9 * 32 + 32);
        assert_eq!(
            decode_decision(&bytes, MAX_RATIONALE_BYTES).unwrap().rationale,
            ""
        );
    }

    #[test]
    fn truncated_payload_rejected() {
        let bytes = encode_decision(&decision("ok")).unwrap();
        for cut in [0, 1, 31, 32, 100, bytes.len() - 1] {
            let err = decode_decision(&bytes[..cut], MAX_RATIONALE_BYTES).unwrap_err();
            assert!(
                matches!(err, VerdictError::MalformedDecision { .. }),
                "cut at {cut}: {err:?}"
            );
        }
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode_decision(&decision("ok")).unwrap();
        bytes.extend_from_slice(&[0u8; 32]);
        assert!(decode_decision(&bytes, MAX_RATIONALE_BYTES).is_err());
    }

    #[test]
    fn non_canonical_bool_rejected() {
        let mut bytes = encode_decision(&decision("ok")).unwrap();
        bytes[2 * WORD_BYTES + 31] = 2;
        let err = decode_decision(&bytes, MAX_RATIONALE_BYTES).unwrap_err();
        assert!(format!("{err}").contains("approved must be 0 or 1"));
    }

    #[test]
    fn dirty_address_rejected() {
        let mut bytes = encode_decision(&decision("ok")).unwrap();
        bytes[4 * WORD_BYTES] = 0xff;
        assert!(decode_decision(&bytes, MAX_RATIONALE_BYTES).is_err());
    }

    #[test]
    fn wrong_offsets_rejected() {
        let mut bytes = encode_decision(&decision("ok")).unwrap();
        bytes[31] = 0x40;
        assert!(decode_decision(&bytes, MAX_RATIONALE_BYTES).is_err());

        let mut bytes = encode_decision(&decision("ok")).unwrap();
        bytes[6 * WORD_BYTES - 1] = 0x40;
        assert!(decode_decision(&bytes, MAX_RATIONALE_BYTES).is_err());
    }

    #[test]
    fn dirty_padding_rejected() {
        let mut bytes = encode_decision(&decision("ok")).unwrap();
        let last = bytes.len() - 1;
        bytes[last] = 1;
        let err = decode_decision(&bytes, MAX_RATIONALE_BYTES).unwrap_err();
        assert!(format!("{err}").contains("padding"));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut bytes = encode_decision(&decision("ok")).unwrap();
        bytes[11 * WORD_BYTES] = 0xff;
        assert!(decode_decision(&bytes, MAX_RATIONALE_BYTES).is_err());
    }

    #[test]
    fn oversized_rationale_rejected() {
        let long = "x".repeat(MAX_RATIONALE_BYTES + 1);
        let bytes = encode_decision(&decision(&long)).unwrap();
        let err = decode_decision(&bytes, MAX_RATIONALE_BYTES).unwrap_err();
        assert!(matches!(err, VerdictError::MalformedDecision { .. }));

        let fits = "x".repeat(MAX_RATIONALE_BYTES);
        let bytes = encode_decision(&decision(&fits)).unwrap();
        assert!(decode_decision(&bytes, MAX_RATIONALE_BYTES).is_ok());
    }

    #[test]
    fn amount_above_128_bits_rejected() {
        let mut bytes = encode_decision(&decision("ok")).unwrap();
        bytes[3 * WORD_BYTES] = 1;
        let err = decode_decision(&bytes, MAX_RATIONALE_BYTES).unwrap_err();
        assert!(format!("{err}").contains("applied_amount overflows"));
    }

    #[test]
    fn case_id_above_u64_rejected() {
        let mut bytes = encode_decision(&decision("ok")).unwrap();
        bytes[9 * WORD_BYTES + 16] = 1;
        assert!(decode_decision(&bytes, MAX_RATIONALE_BYTES).is_err());
    }

    #[test]
    fn unrepresentable_amount_cannot_be_encoded() {
        let mut d = decision("ok");
        d.applied_amount = Decimal::NEGATIVE_ONE;
        assert!(encode_decision(&d).is_err());
    }
}
