//! Versioned page envelopes (BSP v1-v5).
//!
//! Layout of a v5 page, symbol by symbol:
//!
//! ```text
//! [d][LLLLLLLL][body....][aaaa padding to 3200]
//!  |  |         |
//!  |  |         `- payload as one base-29 integer, ceil(len*8/log2 29) symbols
//!  |  `- payload byte length, fixed 8-symbol base-29 field
//!  `- version marker
//! ```
//!
//! Markers `a`, `b`, `c` identify the legacy envelopes (BSP 1-2, 3, and 4),
//! which share a variable-width length prefix. They are decoded read-only;
//! writing always produces v5.

use num_bigint::BigUint;

use bsp_core::{CHUNK_PAYLOAD_MAX, PAGE_SIZE};

use crate::alphabet::{symbol_index, ZERO_SYMBOL};
use crate::base29::{decode_small, decode_symbols, encode_fixed_width};
use crate::error::CodecError;

/// Symbol width of the v5 length field. `29^8 > 5 * 10^11`, far above any
/// payload a page can carry.
pub const LEN_WIDTH: usize = 8;

/// Version marker plus length field.
pub const ENVELOPE_OVERHEAD: usize = 1 + LEN_WIDTH;

/// `log2(29)`: bits carried per symbol.
const LOG2_BASE: f64 = 4.857_980_995_127_572;

/// Symbols required per payload byte: `8 / log2(29)`, about 1.6476.
#[must_use]
pub fn encoding_overhead() -> f64 {
    8.0 / LOG2_BASE
}

/// Symbols needed for the body of a `len`-byte payload.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn body_width(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((len as f64) * 8.0 / LOG2_BASE).ceil() as usize
}

/// Most payload bytes that fit in `symbols` body symbols.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn max_payload_bytes(symbols: usize) -> usize {
    ((symbols as f64) * LOG2_BASE / 8.0).floor() as usize
}

/// Envelope versions across the protocol's history.
///
/// BSP 1 and 2 share a page layout (the 2 bump added per-chunk hashes to
/// the metadata, not a new envelope), so both map to marker `a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeVersion {
    /// BSP 1 envelope (marker `a`).
    V1,
    /// BSP 2 envelope (marker `a`).
    V2,
    /// BSP 3 envelope (marker `b`).
    V3,
    /// BSP 4 envelope (marker `c`).
    V4,
    /// BSP 5 envelope (marker `d`), the only version ever written.
    V5,
}

impl EnvelopeVersion {
    /// The marker symbol this version writes.
    #[must_use]
    pub const fn marker(self) -> u8 {
        match self {
            Self::V1 | Self::V2 => b'a',
            Self::V3 => b'b',
            Self::V4 => b'c',
            Self::V5 => b'd',
        }
    }

    /// Resolve a marker symbol to its envelope version.
    ///
    /// Marker `a` canonicalizes to [`Self::V2`].
    #[must_use]
    pub const fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'a' => Some(Self::V2),
            b'b' => Some(Self::V3),
            b'c' => Some(Self::V4),
            b'd' => Some(Self::V5),
            _ => None,
        }
    }
}

/// Identify the envelope version of a page without decoding it.
///
/// # Errors
///
/// Returns [`CodecError::BadVersion`] for an unrecognized marker and
/// [`CodecError::BadLength`] for an empty page.
pub fn detect_version(page: &str) -> Result<EnvelopeVersion, CodecError> {
    let first = *page.as_bytes().first().ok_or(CodecError::BadLength {
        declared: 1,
        capacity: 0,
    })?;
    EnvelopeVersion::from_marker(first).ok_or(CodecError::BadVersion {
        marker: first as char,
    })
}

/// Encode a payload into one full page (always v5).
///
/// The result is exactly [`PAGE_SIZE`] symbols, every one of them in the
/// alphabet, padded with the zero symbol.
///
/// # Errors
///
/// Returns [`CodecError::BadLength`] if the payload exceeds
/// [`CHUNK_PAYLOAD_MAX`].
pub fn encode_page(data: &[u8]) -> Result<String, CodecError> {
    if data.len() > CHUNK_PAYLOAD_MAX {
        return Err(CodecError::BadLength {
            declared: data.len(),
            capacity: CHUNK_PAYLOAD_MAX,
        });
    }

    let mut page = Vec::with_capacity(PAGE_SIZE);
    page.push(EnvelopeVersion::V5.marker());
    page.extend(encode_fixed_width(&BigUint::from(data.len()), LEN_WIDTH));
    if !data.is_empty() {
        let value = BigUint::from_bytes_be(data);
        page.extend(encode_fixed_width(&value, body_width(data.len())));
    }
    page.resize(PAGE_SIZE, ZERO_SYMBOL);

    Ok(String::from_utf8(page).expect("alphabet symbols are ASCII"))
}

/// Decode a page back to its payload bytes.
///
/// Dispatches on the version marker; trailing padding is ignored. All
/// failures are fatal to the page, there is no partial decode.
///
/// # Errors
///
/// [`CodecError::BadVersion`] for an unknown marker,
/// [`CodecError::BadAlphabet`] for a foreign symbol in a field the decoder
/// reads, [`CodecError::BadLength`] when the declared length does not fit
/// the page.
pub fn decode_page(page: &str) -> Result<Vec<u8>, CodecError> {
    match detect_version(page)? {
        EnvelopeVersion::V5 => decode_v5(page.as_bytes()),
        EnvelopeVersion::V1 | EnvelopeVersion::V2 | EnvelopeVersion::V3 | EnvelopeVersion::V4 => {
            decode_legacy(page.as_bytes())
        }
    }
}

fn decode_v5(symbols: &[u8]) -> Result<Vec<u8>, CodecError> {
    if symbols.len() < ENVELOPE_OVERHEAD {
        return Err(CodecError::BadLength {
            declared: ENVELOPE_OVERHEAD,
            capacity: symbols.len(),
        });
    }

    let declared = decode_small(&symbols[1..ENVELOPE_OVERHEAD], 1)?;
    let declared = usize::try_from(declared).map_err(|_| CodecError::BadLength {
        declared: usize::MAX,
        capacity: max_payload_bytes(PAGE_SIZE - ENVELOPE_OVERHEAD),
    })?;

    let available = symbols.len() - ENVELOPE_OVERHEAD;
    let needed = body_width(declared);
    if needed > available {
        return Err(CodecError::BadLength {
            declared,
            capacity: max_payload_bytes(available),
        });
    }

    if declared == 0 {
        return Ok(Vec::new());
    }

    let body = &symbols[ENVELOPE_OVERHEAD..ENVELOPE_OVERHEAD + needed];
    let value = decode_symbols(body, ENVELOPE_OVERHEAD)?;
    render_bytes(&value, declared)
}

/// Legacy layout shared by markers `a`, `b`, `c`:
/// `[marker][n][byte_len: n symbols][m][body_len: m symbols][body]`.
fn decode_legacy(symbols: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut pos = 1;
    let byte_len = read_legacy_length(symbols, &mut pos)?;
    let body_len = read_legacy_length(symbols, &mut pos)?;

    if byte_len > max_payload_bytes(symbols.len()) {
        return Err(CodecError::BadLength {
            declared: byte_len,
            capacity: max_payload_bytes(symbols.len()),
        });
    }
    if pos + body_len > symbols.len() {
        return Err(CodecError::BadLength {
            declared: body_len,
            capacity: symbols.len() - pos,
        });
    }

    if byte_len == 0 {
        return Ok(Vec::new());
    }

    let value = decode_symbols(&symbols[pos..pos + body_len], pos)?;
    render_bytes(&value, byte_len)
}

/// Read one `[size][value]` variable-width length field.
fn read_legacy_length(symbols: &[u8], pos: &mut usize) -> Result<usize, CodecError> {
    let size_symbol = *symbols.get(*pos).ok_or(CodecError::BadLength {
        declared: *pos + 1,
        capacity: symbols.len(),
    })?;
    let size = usize::from(symbol_index(size_symbol).ok_or(CodecError::BadAlphabet {
        symbol: size_symbol as char,
        position: *pos,
    })?);
    *pos += 1;

    if *pos + size > symbols.len() {
        return Err(CodecError::BadLength {
            declared: size,
            capacity: symbols.len() - *pos,
        });
    }
    let value = decode_small(&symbols[*pos..*pos + size], *pos)?;
    *pos += size;

    usize::try_from(value).map_err(|_| CodecError::BadLength {
        declared: usize::MAX,
        capacity: max_payload_bytes(PAGE_SIZE),
    })
}

/// Render a decoded integer as exactly `len` big-endian bytes.
fn render_bytes(value: &BigUint, len: usize) -> Result<Vec<u8>, CodecError> {
    let bytes = value.to_bytes_be();
    // BigUint renders zero as a single zero byte.
    let bytes = if bytes == [0] { Vec::new() } else { bytes };
    if bytes.len() > len {
        return Err(CodecError::BadLength {
            declared: bytes.len(),
            capacity: len,
        });
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend(bytes);
    Ok(out)
}
