//! Codec error types.

use thiserror::Error;

/// Errors raised while encoding or decoding a page.
///
/// All three are fatal to the page; there is no partial decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The first symbol of the page is not a recognized version marker.
    #[error("unrecognized envelope version marker {marker:?}")]
    BadVersion {
        /// The symbol found where the marker should be.
        marker: char,
    },

    /// A byte outside the 29-symbol alphabet was encountered.
    #[error("symbol {symbol:?} at position {position} is outside the base-29 alphabet")]
    BadAlphabet {
        /// The offending character.
        symbol: char,
        /// Byte offset within the page text.
        position: usize,
    },

    /// A declared or implied length does not fit the page.
    #[error("payload length {declared} exceeds capacity {capacity}")]
    BadLength {
        /// Length declared by the envelope (or requested by the caller).
        declared: usize,
        /// What the page can actually carry or provide.
        capacity: usize,
    },
}
