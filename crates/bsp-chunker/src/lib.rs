//! BSP Chunker - compress, split, integrity-stamp; reassemble and verify.
//!
//! The encode side turns an input byte stream into a zstd stream split into
//! chunks of at most [`bsp_core::CHUNK_PAYLOAD_MAX`] bytes, each stamped
//! with its SHA-256. The decode side verifies and reassembles, honoring
//! strict mode: any anomaly is fatal under strict, degraded to a warning
//! otherwise.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod estimate;
mod reassemble;
mod split;

pub use error::*;
pub use estimate::*;
pub use reassemble::*;
pub use split::*;

/// zstd level every new record is compressed with.
pub const COMPRESSION_LEVEL: i32 = 19;
