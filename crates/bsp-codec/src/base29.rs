//! Base-29 integer rendering helpers.

use num_bigint::BigUint;

use crate::alphabet::{digit_symbol, symbol_index, BASE};
use crate::error::CodecError;

/// Render a big-endian unsigned integer as exactly `width` symbols,
/// left-padded with the zero symbol.
///
/// Callers must size `width` so the value fits; the codec derives widths
/// from the declared payload length, which guarantees it.
pub(crate) fn encode_fixed_width(value: &BigUint, width: usize) -> Vec<u8> {
    let digits = value.to_radix_be(BASE);
    debug_assert!(digits.len() <= width, "value wider than field");
    let mut out = Vec::with_capacity(width);
    out.resize(width - digits.len(), digit_symbol(0));
    out.extend(digits.iter().map(|d| digit_symbol(*d)));
    out
}

/// Interpret `symbols` as a big-endian base-29 integer.
///
/// # Errors
///
/// Returns [`CodecError::BadAlphabet`] on the first foreign byte.
pub(crate) fn decode_symbols(symbols: &[u8], offset: usize) -> Result<BigUint, CodecError> {
    let mut digits = Vec::with_capacity(symbols.len());
    for (i, symbol) in symbols.iter().enumerate() {
        let digit = symbol_index(*symbol).ok_or(CodecError::BadAlphabet {
            symbol: *symbol as char,
            position: offset + i,
        })?;
        digits.push(digit);
    }
    Ok(BigUint::from_radix_be(&digits, BASE).unwrap_or_default())
}

/// Decode a small fixed-width field into a `u64`.
///
/// Used for length fields. Overflow means the field declares a length no
/// page could ever carry, which is reported as a length error.
pub(crate) fn decode_small(symbols: &[u8], offset: usize) -> Result<u64, CodecError> {
    let mut value: u64 = 0;
    for (i, symbol) in symbols.iter().enumerate() {
        let digit = symbol_index(*symbol).ok_or(CodecError::BadAlphabet {
            symbol: *symbol as char,
            position: offset + i,
        })?;
        value = value
            .checked_mul(u64::from(BASE))
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or(CodecError::BadLength {
                declared: usize::MAX,
                capacity: crate::envelope::max_payload_bytes(symbols.len()),
            })?;
    }
    Ok(value)
}
