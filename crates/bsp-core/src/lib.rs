//! BSP Core - shared types for the Babel Storage Protocol.
//!
//! This crate provides the data model the rest of the workspace builds on:
//! page coordinates, the persisted [`FileRecord`], protocol-version gating,
//! and the gzipped-JSON metadata envelope.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod coordinate;
mod envelope;
mod error;
mod record;
mod report;

pub use coordinate::*;
pub use envelope::*;
pub use error::*;
pub use record::*;
pub use report::*;

/// Exact symbol count of a Library of Babel page.
pub const PAGE_SIZE: usize = 3200;

/// Maximum payload bytes carried by a single chunk.
///
/// The theoretical page capacity is `floor((PAGE_SIZE - 9) / 1.6476) ~= 1935`
/// bytes; the protocol pins the conservative value 1850 to leave margin for
/// future envelope growth.
pub const CHUNK_PAYLOAD_MAX: usize = 1850;

/// Hard cap on input file size (128 MiB).
///
/// Larger inputs produce coordinate counts the external service will not
/// tolerate and metadata blobs beyond JSON practicality.
pub const MAX_INPUT_SIZE: u64 = 128 * 1024 * 1024;
